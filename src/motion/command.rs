// src/motion/command.rs

use core::fmt;

use crate::common::types::AxisOffsets;

/// One line of G-code understood by the motion controller.
///
/// The `Display` implementation emits the wire form without the trailing
/// CRLF; the transport appends that.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    /// `T<n>` - select a tool.
    SelectTool(u8),
    /// `M400` - acknowledge only once queued moves have finished.
    WaitForMoves,
    /// `G10 P<tool> [X..][Y..][Z..]` - set the listed tool offsets.
    SetToolOffset { tool: u8, offsets: AxisOffsets },
    /// `M114` - report the current position.
    QueryPosition,
    /// `M500 P10` - persist tool offsets in the controller's config.
    StoreParameters,
    /// Any other line (motion, heating, homing), passed through untouched.
    Raw(String),
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::SelectTool(tool) => write!(f, "T{tool}"),
            MotionCommand::WaitForMoves => f.write_str("M400"),
            MotionCommand::SetToolOffset { tool, offsets } => {
                write!(f, "G10 P{tool}")?;
                for (axis, value) in offsets.entries() {
                    write!(f, " {axis}{value}")?;
                }
                Ok(())
            }
            MotionCommand::QueryPosition => f.write_str("M114"),
            MotionCommand::StoreParameters => f.write_str("M500 P10"),
            MotionCommand::Raw(line) => f.write_str(line),
        }
    }
}
