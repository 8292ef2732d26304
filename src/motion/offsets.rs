// src/motion/offsets.rs

use core::fmt::Debug;

use crate::common::error::LinkError;
use crate::common::port::LinkPort;
use crate::common::types::{AxisOffsets, Position};

use super::{AckOutcome, MotionCommand, MotionLink};

impl<P: LinkPort> MotionLink<P> {
    /// Sets the listed offsets for one tool via `G10`.
    pub fn set_tool_offset(
        &mut self,
        tool: u8,
        offsets: AxisOffsets,
    ) -> Result<AckOutcome, LinkError<P::Error>> {
        let budget = self.config.offset_budget;
        self.send_and_wait(&MotionCommand::SetToolOffset { tool, offsets }, budget)
    }

    /// Computes and applies a differential offset for one tool: select the
    /// tool, let motion settle, measure, zero the requested axes, measure
    /// again, then write back `(pos0 - pos1) + extra` per axis. Returns the
    /// offsets that were applied.
    ///
    /// The printer has a single current coordinate frame, so this must run
    /// as one uninterrupted sequence per tool; taking `&mut self` keeps two
    /// of these from interleaving.
    pub fn apply_differential_offset(
        &mut self,
        tool: u8,
        extra: AxisOffsets,
    ) -> Result<AxisOffsets, LinkError<P::Error>> {
        let select = self.config.select_budget;
        self.send_and_wait(&MotionCommand::SelectTool(tool), select)?;
        self.send_and_wait(&MotionCommand::WaitForMoves, select)?;

        let pos0 = self.query_position()?;
        // Bail before touching the tool's offsets, not after.
        require_decoded(&pos0, &extra)?;

        let mut zeroed = AxisOffsets::default();
        for axis in extra.axes() {
            zeroed.set(axis, 0.0);
        }
        self.set_tool_offset(tool, zeroed)?;

        let pos1 = self.query_position()?;
        require_decoded(&pos1, &extra)?;

        let mut applied = AxisOffsets::default();
        for (axis, extra_offset) in extra.entries() {
            let differential = pos0.get(axis).value - pos1.get(axis).value;
            applied.set(axis, differential + extra_offset);
        }
        self.set_tool_offset(tool, applied)?;
        Ok(applied)
    }

    /// Persists the current tool offsets in the controller's non-volatile
    /// config. Fire-and-forget: the controller's reply carries nothing
    /// worth waiting on.
    pub fn persist_offsets(&mut self) -> Result<(), LinkError<P::Error>> {
        self.send(&MotionCommand::StoreParameters)
    }
}

/// Refuses to fold a defaulted 0.0 coordinate into an offset computation.
fn require_decoded<E: Debug>(pos: &Position, wanted: &AxisOffsets) -> Result<(), LinkError<E>> {
    for axis in wanted.axes() {
        if !pos.get(axis).decoded {
            return Err(LinkError::UndecodedAxis { axis });
        }
    }
    Ok(())
}
