// src/sensor/registers.rs
//
// Register access against the module's internal register file, plus the
// fixed initialization sequence for high-resolution continuous conversion.
// Register exchanges share the ingested byte stream with sampling; callers
// must not interleave the two.

use core::fmt;

use crate::common::error::LinkError;
use crate::common::port::LinkPort;

use super::SensorLink;

/// Offset of the read/echoed value within a register exchange response.
const RESPONSE_VALUE_OFFSET: usize = 8;

/// One command understood by the evaluation module's serial bridge.
///
/// The `Display` implementation emits the complete wire form: ASCII hex,
/// CRLF-terminated for register accesses, bare for the conversion controls.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EvmCommand {
    /// `07` - stop the running conversion.
    StopConversion,
    /// `0638` - start a 24-bit high-resolution (LHR) conversion.
    StartLhrConversion,
    /// `03aa` - read register `aa`.
    ReadRegister { register: u8 },
    /// `02aavv` - write `vv` to register `aa`.
    WriteRegister { register: u8, value: u8 },
}

impl fmt::Display for EvmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvmCommand::StopConversion => f.write_str("07"),
            EvmCommand::StartLhrConversion => f.write_str("0638"),
            EvmCommand::ReadRegister { register } => write!(f, "03{register:02X}\r\n"),
            EvmCommand::WriteRegister { register, value } => {
                write!(f, "02{register:02X}{value:02X}\r\n")
            }
        }
    }
}

/// How a register-echo mismatch during initialization is handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// First mismatch aborts the sequence.
    #[default]
    Abort,
    /// Mismatches are logged and the sequence continues. This is how the
    /// vendor tool behaves.
    LogAndContinue,
}

/// The register writes that put the module into high-resolution continuous
/// conversion, in the order the vendor tool issues them.
pub(super) const LHR_INIT_SEQUENCE: &[(u8, u8)] = &[
    (0x0B, 0x01), // sleep mode
    (0x01, 0x07), // Rp range to maximum
    (0x05, 0x01), // L-only optimisation
    (0x0C, 0x01), // keep converting when amplitude regulation fails
    (0x0B, 0x01), // sleep mode again before timing setup
    (0x34, 0x00), // LHR downsampling off
    (0x32, 0x00), // inductance offset cleared
    (0x3B, 0x00), // status register cleared
    (0x0A, 0x00), // interrupt pin unused
    (0x04, 0x07), // maximum settling time
    (0x30, 0xFF), // conversion time, LSB
    (0x31, 0x0F), // conversion time, MSB
    (0x0B, 0x00), // active conversion mode
];

impl<P: LinkPort> SensorLink<P> {
    /// Reads one register.
    pub fn read_register(&mut self, register: u8) -> Result<u8, LinkError<P::Error>> {
        self.send(EvmCommand::ReadRegister { register })?;
        self.take_exchange_value()
    }

    /// Writes one register and verifies the value the module echoes back.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), LinkError<P::Error>> {
        self.send(EvmCommand::WriteRegister { register, value })?;
        let echoed = self.take_exchange_value()?;
        if echoed == value {
            Ok(())
        } else {
            Err(LinkError::RegisterMismatch {
                register,
                wrote: value,
                echoed,
            })
        }
    }

    /// Puts the module into high-resolution continuous conversion mode:
    /// stop the running conversion, flush the stream to a known empty state
    /// (so a stale measurement frame cannot pass for a register echo), walk
    /// the fixed write sequence, then start converting.
    ///
    /// Echo mismatches follow [`SensorConfig::mismatch_policy`]: abort on
    /// the first one, or log each and press on.
    ///
    /// [`SensorConfig::mismatch_policy`]: super::SensorConfig
    pub fn lhr_init(&mut self) -> Result<(), LinkError<P::Error>> {
        self.send(EvmCommand::StopConversion)?;
        self.flush()?;
        for &(register, value) in LHR_INIT_SEQUENCE {
            match self.write_register(register, value) {
                Ok(()) => {}
                Err(e @ LinkError::RegisterMismatch { .. }) => match self.config.mismatch_policy {
                    MismatchPolicy::Abort => return Err(e),
                    MismatchPolicy::LogAndContinue => log::warn!("lhr init: {e}"),
                },
                Err(e) => return Err(e),
            }
        }
        self.send(EvmCommand::StartLhrConversion)
    }

    fn send(&mut self, command: EvmCommand) -> Result<(), LinkError<P::Error>> {
        let line = format!("{command}");
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Waits until the exchange's value byte is buffered, returns it, and
    /// discards the rest of the exchange.
    fn take_exchange_value(&mut self) -> Result<u8, LinkError<P::Error>> {
        self.fill_pending(RESPONSE_VALUE_OFFSET + 1)?;
        let value = self.pending[RESPONSE_VALUE_OFFSET];
        self.pending.clear();
        Ok(value)
    }
}
