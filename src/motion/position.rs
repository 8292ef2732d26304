// src/motion/position.rs

use crate::common::error::LinkError;
use crate::common::port::LinkPort;
use crate::common::types::{Axis, AxisValue, Position};

use super::{MotionCommand, MotionLink};

impl<P: LinkPort> MotionLink<P> {
    /// Queries the current position with `M114` and scans the response for
    /// the three axis fields.
    pub fn query_position(&mut self) -> Result<Position, LinkError<P::Error>> {
        self.send(&MotionCommand::QueryPosition)?;
        self.scan_position()
    }

    /// Single-pass, marker-driven field extraction: a two-byte lookback
    /// window spots `X:`/`Y:`/`Z:` anywhere in the response text, then the
    /// field accumulates until a space. No rigid response layout is assumed.
    /// Bounded by the configured scan read budget.
    fn scan_position(&mut self) -> Result<Position, LinkError<P::Error>> {
        let budget = self.config.scan_read_budget;
        let mut reads = 0u32;
        let mut fields = [String::new(), String::new(), String::new()];
        let mut previous: Option<u8> = None;

        while fields.iter().any(|field| field.is_empty()) {
            let current = self.budgeted_read(&mut reads, budget)?;
            if let (Some(tag), Some(b':')) = (previous, current) {
                if let Some(axis) = Axis::from_tag(tag) {
                    self.accumulate_field(&mut fields[axis.index()], &mut reads, budget)?;
                    // The field's terminating space is the newest byte seen.
                    previous = Some(b' ');
                    continue;
                }
            }
            previous = current;
        }

        let [x, y, z] = fields;
        Ok(Position {
            x: decode_axis(Axis::X, &x),
            y: decode_axis(Axis::Y, &y),
            z: decode_axis(Axis::Z, &z),
        })
    }

    fn budgeted_read(
        &mut self,
        reads: &mut u32,
        budget: u32,
    ) -> Result<Option<u8>, LinkError<P::Error>> {
        if *reads >= budget {
            return Err(LinkError::Timeout);
        }
        *reads += 1;
        Ok(self.port.read_byte()?)
    }

    /// Accumulates field text until the terminating space. Timed-out reads
    /// neither extend nor terminate the field.
    fn accumulate_field(
        &mut self,
        field: &mut String,
        reads: &mut u32,
        budget: u32,
    ) -> Result<(), LinkError<P::Error>> {
        loop {
            match self.budgeted_read(reads, budget)? {
                Some(b' ') => return Ok(()),
                Some(byte) => field.push(byte as char),
                None => {}
            }
        }
    }
}

/// Decodes one accumulated field. Failure defaults the value to 0.0 and
/// flags the axis instead of failing the whole query.
fn decode_axis(axis: Axis, text: &str) -> AxisValue {
    match text.parse::<f64>() {
        Ok(value) => AxisValue { value, decoded: true },
        Err(_) => {
            log::warn!("could not decode {axis} position field {text:?}, defaulting to 0.0");
            AxisValue { value: 0.0, decoded: false }
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::super::testport::ScriptPort;
    use super::super::{MotionConfig, MotionLink};
    use crate::common::error::LinkError;
    use crate::common::types::Axis;

    fn link(port: ScriptPort) -> MotionLink<ScriptPort> {
        MotionLink::open(port, MotionConfig::default())
    }

    #[test]
    fn extracts_fields_from_arbitrary_surrounding_text() {
        let mut link = link(ScriptPort::with_bytes(
            b"junkX:12.5 junkY:-3.0 junkZ:0.25 trailing",
        ));
        let pos = link.query_position().unwrap();
        assert_eq!(link.port.written_str(), "M114\r\n");
        assert_eq!(pos.x.value, 12.5);
        assert_eq!(pos.y.value, -3.0);
        assert_eq!(pos.z.value, 0.25);
        assert!(pos.is_complete());
    }

    #[test]
    fn non_numeric_field_defaults_to_zero_and_is_flagged() {
        let mut link = link(ScriptPort::with_bytes(b"X:1.0 Y:2.0 Z:abc "));
        let pos = link.query_position().unwrap();
        assert_eq!(pos.x.value, 1.0);
        assert_eq!(pos.y.value, 2.0);
        assert!(pos.x.decoded && pos.y.decoded);
        assert_eq!(pos.z.value, 0.0);
        assert!(!pos.z.decoded);
        assert!(!pos.is_complete());
    }

    #[test]
    fn scan_is_bounded_by_the_read_budget() {
        let config = MotionConfig {
            scan_read_budget: 32,
            ..MotionConfig::default()
        };
        let port = ScriptPort::with_bytes(b"no coordinates here");
        let mut link = MotionLink::open(port, config);
        match link.query_position() {
            Err(LinkError::Timeout) => {}
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert_eq!(link.port.read_attempts, 32);
    }

    #[test]
    fn timed_out_read_breaks_a_tag_but_not_a_field() {
        let mut port = ScriptPort::new();
        // `X` and `:` separated by a timeout: not a tag match.
        port.push_bytes(b"X");
        port.push_quiet();
        port.push_bytes(b":1.0 ");
        // A timeout inside the digits merely pauses accumulation.
        port.push_bytes(b"X:2");
        port.push_quiet();
        port.push_bytes(b".5 Y:3.0 Z:4.0 ");
        let mut link = link(port);
        let pos = link.query_position().unwrap();
        assert_eq!(pos.get(Axis::X).value, 2.5);
        assert_eq!(pos.get(Axis::Y).value, 3.0);
        assert_eq!(pos.get(Axis::Z).value, 4.0);
    }
}
