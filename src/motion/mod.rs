// src/motion/mod.rs

mod command;
mod offsets;
mod position;

pub use command::MotionCommand;

use std::time::{Duration, Instant};

use crate::common::error::LinkError;
use crate::common::port::LinkPort;
use crate::common::timing;

/// Outcome of waiting for a command acknowledgement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// The `ok` token was observed.
    Acknowledged,
    /// The watchdog budget ran out first. The command is still assumed to
    /// have been issued: this wait paces command traffic, it does not prove
    /// completion.
    WatchdogExpired,
}

impl AckOutcome {
    pub fn acknowledged(self) -> bool {
        matches!(self, AckOutcome::Acknowledged)
    }
}

/// Watchdog budget for an acknowledgement wait.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AckBudget {
    /// At most this many single-byte read attempts. Wall-clock meaning is
    /// coupled to the port's per-read timeout.
    Reads(u32),
    /// A wall-clock deadline, independent of the per-read timeout.
    Time(Duration),
}

/// Tunables for one motion link.
#[derive(Debug, Clone)]
pub struct MotionConfig {
    /// Budget while waiting for `ok` after a tool select or M400.
    pub select_budget: AckBudget,
    /// Budget while waiting for `ok` after a G10 offset line.
    pub offset_budget: AckBudget,
    /// Read attempts allowed while scanning one position report.
    pub scan_read_budget: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        MotionConfig {
            select_budget: AckBudget::Reads(timing::SELECT_ACK_READS),
            offset_budget: AckBudget::Reads(timing::OFFSET_ACK_READS),
            scan_read_budget: timing::DEFAULT_SCAN_READS,
        }
    }
}

/// Driver for the G-code motion controller.
///
/// A single synchronous actor: one send, one bounded wait, per call. No
/// command is ever in flight concurrently with another.
#[derive(Debug)]
pub struct MotionLink<P: LinkPort> {
    port: P,
    config: MotionConfig,
}

impl<P: LinkPort> MotionLink<P> {
    pub fn open(port: P, config: MotionConfig) -> Self {
        MotionLink { port, config }
    }

    /// Closes the link by dropping the port.
    pub fn close(self) {}

    /// Sends one command line without waiting for an acknowledgement.
    pub fn send(&mut self, command: &MotionCommand) -> Result<(), LinkError<P::Error>> {
        let line = format!("{command}\r\n");
        self.port.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Sends one command line and waits for the controller's `ok`, bounded
    /// by `budget`. Budget exhaustion is logged and reported as a value,
    /// never as an error; the command is still assumed sent.
    pub fn send_and_wait(
        &mut self,
        command: &MotionCommand,
        budget: AckBudget,
    ) -> Result<AckOutcome, LinkError<P::Error>> {
        self.send(command)?;
        self.wait_for_ack(command, budget)
    }

    fn wait_for_ack(
        &mut self,
        command: &MotionCommand,
        budget: AckBudget,
    ) -> Result<AckOutcome, LinkError<P::Error>> {
        let mut previous: Option<u8> = None;
        match budget {
            AckBudget::Reads(max) => {
                for _ in 0..max {
                    let current = self.port.read_byte()?;
                    if previous == Some(b'o') && current == Some(b'k') {
                        return Ok(AckOutcome::Acknowledged);
                    }
                    // A timed-out read clears the lookback: `o` and `k`
                    // must arrive in consecutive reads.
                    previous = current;
                }
            }
            AckBudget::Time(limit) => {
                let deadline = Instant::now() + limit;
                while Instant::now() < deadline {
                    let current = self.port.read_byte()?;
                    if previous == Some(b'o') && current == Some(b'k') {
                        return Ok(AckOutcome::Acknowledged);
                    }
                    previous = current;
                }
            }
        }
        log::warn!("acknowledgement watchdog expired for `{command}`");
        Ok(AckOutcome::WatchdogExpired)
    }
}

// Scripted port shared by the motion-side test modules.
#[cfg(test)]
pub(crate) mod testport {
    use std::collections::VecDeque;

    use crate::common::port::LinkPort;

    #[derive(Debug)]
    pub struct ScriptError;

    /// Single-threaded scripted port: each entry is one read result, `None`
    /// standing in for a timed-out read. An exhausted script keeps timing
    /// out.
    #[derive(Debug, Default)]
    pub struct ScriptPort {
        pub reads: VecDeque<Option<u8>>,
        pub written: Vec<u8>,
        pub read_attempts: usize,
    }

    impl ScriptPort {
        pub fn new() -> Self {
            ScriptPort::default()
        }

        pub fn with_bytes(bytes: &[u8]) -> Self {
            let mut port = ScriptPort::new();
            port.push_bytes(bytes);
            port
        }

        pub fn push_bytes(&mut self, bytes: &[u8]) {
            self.reads.extend(bytes.iter().copied().map(Some));
        }

        pub fn push_quiet(&mut self) {
            self.reads.push_back(None);
        }

        pub fn written_str(&self) -> String {
            String::from_utf8_lossy(&self.written).into_owned()
        }
    }

    impl LinkPort for ScriptPort {
        type Error = ScriptError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ScriptError> {
            self.read_attempts += 1;
            match self.reads.pop_front() {
                Some(Some(byte)) => {
                    buf[0] = byte;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), ScriptError> {
            self.written.extend_from_slice(bytes);
            Ok(())
        }

        fn discard_input(&mut self) -> Result<(), ScriptError> {
            self.reads.clear();
            Ok(())
        }

        fn try_clone(&self) -> Result<Self, ScriptError> {
            // The motion link never clones its port.
            Err(ScriptError)
        }
    }
}
