// src/sensor/frame.rs

/// Length of one high-resolution measurement frame on the wire.
pub const FRAME_LEN: usize = 8;

/// Marker byte the module places at offsets 4, 6 and 7 of a valid frame.
pub const FRAME_MARKER: u8 = 0x5A;

/// Reference oscillator feeding the LHR counter, in Hz.
pub const REFERENCE_CLOCK_HZ: f64 = 12e6;

/// Width of the raw LHR count.
const RAW_BITS: u32 = 24;

/// One validated high-resolution measurement frame.
///
/// Layout: byte 0 unused link payload, bytes 1-3 big-endian raw oscillator
/// count, byte 4 marker, byte 5 unused, bytes 6-7 markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LhrFrame {
    raw: u32,
}

impl LhrFrame {
    /// Validates the first [`FRAME_LEN`] bytes of `window` as a measurement
    /// frame. `None` when the window is short or any marker is missing; the
    /// caller then shifts the stream by one byte and rescans.
    pub fn parse(window: &[u8]) -> Option<Self> {
        if window.len() < FRAME_LEN {
            return None;
        }
        if window[4] != FRAME_MARKER || window[6] != FRAME_MARKER || window[7] != FRAME_MARKER {
            return None;
        }
        let raw = u32::from(window[1]) << 16 | u32::from(window[2]) << 8 | u32::from(window[3]);
        Some(LhrFrame { raw })
    }

    /// The raw 24-bit oscillator count.
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// LC tank oscillation frequency in Hz.
    pub fn oscillator_hz(&self) -> f64 {
        REFERENCE_CLOCK_HZ / f64::from(1u32 << RAW_BITS) * (f64::from(self.raw) + 1.0)
    }

    /// Measured inductance in Henry, for the given tank capacitance in
    /// Farad.
    pub fn inductance(&self, capacitance: f64) -> f64 {
        let omega = 2.0 * core::f64::consts::PI * self.oscillator_hz();
        1.0 / (capacitance * omega * omega)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(raw: u32) -> [u8; FRAME_LEN] {
        [
            0x00,
            (raw >> 16) as u8,
            (raw >> 8) as u8,
            raw as u8,
            FRAME_MARKER,
            0x00,
            FRAME_MARKER,
            FRAME_MARKER,
        ]
    }

    #[test]
    fn parses_valid_window() {
        let frame = LhrFrame::parse(&frame_bytes(0x0123_45)).unwrap();
        assert_eq!(frame.raw(), 0x0123_45);
    }

    #[test]
    fn rejects_short_window() {
        assert_eq!(LhrFrame::parse(&frame_bytes(1)[..7]), None);
    }

    #[test]
    fn rejects_any_bad_marker() {
        for offset in [4usize, 6, 7] {
            let mut bytes = frame_bytes(1);
            bytes[offset] = 0x00;
            assert_eq!(LhrFrame::parse(&bytes), None, "marker at {offset}");
        }
    }

    #[test]
    fn markers_alone_decide_validity() {
        // Bytes 0 and 5 carry no information; anything goes there.
        let mut bytes = frame_bytes(7);
        bytes[0] = 0xFF;
        bytes[5] = 0xAB;
        assert_eq!(LhrFrame::parse(&bytes).unwrap().raw(), 7);
    }

    #[test]
    fn conversion_matches_reference_formula() {
        let capacitance = 1200e-12;
        for raw in [0u32, 1, 0x8000, 0xFF_FFFF] {
            let frame = LhrFrame::parse(&frame_bytes(raw)).unwrap();
            let fosc = 12e6 / 2f64.powi(24) * (f64::from(raw) + 1.0);
            let expected = 1.0 / (capacitance * (2.0 * core::f64::consts::PI * fosc).powi(2));
            let got = frame.inductance(capacitance);
            assert!(
                (got - expected).abs() <= expected * 1e-12,
                "raw={raw}: {got} vs {expected}"
            );
        }
    }
}
