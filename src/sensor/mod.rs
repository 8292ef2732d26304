// src/sensor/mod.rs

mod frame;
mod ingest;
mod registers;

// Re-export the public sensor-side surface
pub use frame::{LhrFrame, FRAME_LEN, FRAME_MARKER, REFERENCE_CLOCK_HZ};
pub use registers::{EvmCommand, MismatchPolicy};

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::common::error::LinkError;
use crate::common::port::LinkPort;
use crate::common::timing;

use ingest::{Chunk, IngestFlags};

/// Tunables for one sensor link.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Tank capacitance soldered onto the module, in Farad. Scales every
    /// reported inductance.
    pub sensor_capacitance: f64,
    /// Deadline for one consumer-side wait (a frame fill or a register
    /// exchange).
    pub read_timeout: Duration,
    /// Consecutive shifted bytes tolerated before frame sync is reported
    /// lost.
    pub resync_byte_budget: usize,
    /// Echo-mismatch handling during [`lhr_init`](SensorLink::lhr_init).
    pub mismatch_policy: MismatchPolicy,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            sensor_capacitance: 1200e-12,
            read_timeout: timing::DEFAULT_SENSOR_WAIT,
            resync_byte_budget: timing::DEFAULT_RESYNC_BUDGET,
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

/// Driver for the inductance-probe evaluation module.
///
/// A background thread continuously drains the port into a channel; all
/// public operations consume from that stream on the caller's thread, in
/// strict FIFO order. Register access and sampling share the stream, so the
/// two must not be interleaved by the caller.
#[derive(Debug)]
pub struct SensorLink<P: LinkPort> {
    writer: P,
    rx: Receiver<Chunk>,
    pending: VecDeque<u8>,
    flags: Arc<IngestFlags>,
    reader: Option<JoinHandle<()>>,
    config: SensorConfig,
}

impl<P: LinkPort + 'static> SensorLink<P> {
    /// Opens the link: clones the port, hands one handle to the background
    /// reader and keeps the other for writes.
    pub fn open(port: P, config: SensorConfig) -> Result<Self, LinkError<P::Error>> {
        let reader_half = port.try_clone()?;
        let flags = Arc::new(IngestFlags::default());
        let (tx, rx) = mpsc::channel();
        let reader = ingest::spawn(reader_half, Arc::clone(&flags), tx);
        Ok(SensorLink {
            writer: port,
            rx,
            pending: VecDeque::new(),
            flags,
            reader: Some(reader),
            config,
        })
    }
}

impl<P: LinkPort> SensorLink<P> {
    /// True once the background reader has died on an I/O error. Latched;
    /// a calibration round in progress should be abandoned when this trips.
    pub fn ingestion_fault(&self) -> bool {
        self.flags.fault.load(Ordering::Acquire)
    }

    /// Averages `ratio` valid frames into one inductance reading in Henry.
    ///
    /// A window that fails the marker check shifts the stream by a single
    /// byte and rescans; bytes consumed that way do not count toward the
    /// ratio. More than [`SensorConfig::resync_byte_budget`] consecutive
    /// shifts reports the sync as lost.
    pub fn sample(&mut self, ratio: NonZeroU32) -> Result<f64, LinkError<P::Error>> {
        let down = f64::from(ratio.get());
        let mut average = 0.0;
        let mut taken = 0u32;
        let mut shifted = 0usize;
        while taken < ratio.get() {
            self.fill_pending(frame::FRAME_LEN)?;
            let window = self.pending.make_contiguous();
            let parsed = LhrFrame::parse(window);
            match parsed {
                Some(f) => {
                    self.pending.drain(..frame::FRAME_LEN);
                    average += f.inductance(self.config.sensor_capacitance) / down;
                    taken += 1;
                    shifted = 0;
                }
                None => {
                    self.pending.pop_front();
                    shifted += 1;
                    if shifted > self.config.resync_byte_budget {
                        return Err(LinkError::SyncLost { scanned: shifted });
                    }
                }
            }
        }
        Ok(average)
    }

    /// Discards everything buffered on both sides of the link, so the next
    /// sample can only come from bytes produced after this call.
    pub fn flush(&mut self) -> Result<(), LinkError<P::Error>> {
        // Bump the flush generation first: a chunk whose read began before
        // this point carries the old stamp and will be dropped even if it
        // arrives later.
        self.flags.epoch.fetch_add(1, Ordering::AcqRel);
        self.writer.discard_input()?;
        while self.rx.try_recv().is_ok() {}
        self.pending.clear();
        Ok(())
    }

    /// Stops the background reader and joins it, then drops the port.
    /// Cooperative: the reader may take up to one read timeout to observe
    /// the flag.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.flags.stop.store(true, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }

    /// Blocks until at least `needed` bytes are pending, bounded by the
    /// configured read timeout. Chunks from before the latest flush are
    /// dropped here.
    fn fill_pending(&mut self, needed: usize) -> Result<(), LinkError<P::Error>> {
        let deadline = Instant::now() + self.config.read_timeout;
        loop {
            let current = self.flags.epoch.load(Ordering::Acquire);
            while let Ok((epoch, chunk)) = self.rx.try_recv() {
                if epoch == current {
                    self.pending.extend(chunk);
                }
            }
            if self.pending.len() >= needed {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(LinkError::Timeout);
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok((epoch, chunk)) => {
                    if epoch == self.flags.epoch.load(Ordering::Acquire) {
                        self.pending.extend(chunk);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(LinkError::IngestionStopped);
                }
            }
        }
    }
}

impl<P: LinkPort> Drop for SensorLink<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
