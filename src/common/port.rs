// src/common/port.rs

use core::fmt::Debug;

/// Byte-level access to one serial link.
///
/// `read` must be bounded by the per-read timeout configured on the
/// underlying port and report a timeout as `Ok(0)`. Every watchdog and scan
/// budget in this crate counts read attempts, so their wall-clock meaning is
/// coupled to that timeout.
pub trait LinkPort: Send {
    /// Associated error type for port-level failures.
    type Error: Debug + Send;

    /// Reads up to `buf.len()` bytes. `Ok(0)` means the per-read timeout
    /// expired with nothing available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Discards anything queued in the device-side receive buffer.
    fn discard_input(&mut self) -> Result<(), Self::Error>;

    /// A second handle onto the same link, so one half can live on a
    /// background reader thread while the other keeps writing.
    fn try_clone(&self) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Reads a single byte; `None` when the per-read timeout expired.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}
