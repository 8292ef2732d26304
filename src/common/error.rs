// src/common/error.rs

use core::fmt::Debug;

use crate::common::types::Axis;

/// Error type shared by both link stacks, generic over the underlying
/// port's error `E`.
///
/// Nothing here is process-fatal: recoverable protocol conditions (the
/// acknowledgement watchdog, lenient register-mismatch handling, a position
/// field that fails to decode) are reported as values or flags instead, so a
/// long calibration run is never torn down by one transient glitch.
#[derive(Debug, thiserror::Error)]
pub enum LinkError<E = ()>
where
    E: Debug,
{
    /// Underlying I/O error from the port implementation.
    #[error("serial I/O error: {0:?}")]
    Io(E),

    /// A wait for response bytes exceeded its deadline or read budget.
    #[error("timed out waiting for response bytes")]
    Timeout,

    /// The background reader terminated after an I/O fault; no more bytes
    /// will ever arrive on this link.
    #[error("byte ingestion stopped after an I/O fault")]
    IngestionStopped,

    /// No valid measurement frame was found within the resync byte budget.
    #[error("frame sync not recovered within {scanned} bytes")]
    SyncLost { scanned: usize },

    /// The value echoed after a register write disagrees with what was
    /// written.
    #[error("register {register:#04x} echoed {echoed:#04x} after writing {wrote:#04x}")]
    RegisterMismatch { register: u8, wrote: u8, echoed: u8 },

    /// A position field needed by an offset computation did not decode;
    /// refusing beats silently computing on a defaulted coordinate.
    #[error("position field {axis} could not be decoded")]
    UndecodedAxis { axis: Axis },
}

// Allow mapping from the underlying port error via `?`.
impl<E: Debug> From<E> for LinkError<E> {
    fn from(e: E) -> Self {
        LinkError::Io(e)
    }
}
