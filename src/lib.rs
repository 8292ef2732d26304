// src/lib.rs

//! Serial drivers for a contactless inductance probe (an LDC1101
//! evaluation module) and a multi-tool G-code motion controller.
//!
//! Two independent stacks, each owning one serial connection:
//!
//! - [`SensorLink`]: a background thread continuously ingests the module's
//!   byte stream; the caller decodes 8-byte measurement frames into
//!   inductance readings ([`SensorLink::sample`]) and performs register
//!   exchanges against the device's internal register file.
//! - [`MotionLink`]: synchronous line-oriented G-code transport with an
//!   `ok`-acknowledgement watchdog, a streaming position parser and the
//!   differential tool-offset protocol built on both.
//!
//! Everything is generic over [`LinkPort`], so the drivers run against real
//! ports (see [`common::serial`], feature `serialport`) or scripted mocks.

pub mod common;
pub mod motion;
pub mod sensor;

// Re-export key types for convenience
pub use common::error::LinkError;
pub use common::port::LinkPort;
pub use common::types::{Axis, AxisOffsets, AxisValue, Position};
pub use motion::{AckBudget, AckOutcome, MotionCommand, MotionConfig, MotionLink};
pub use sensor::{MismatchPolicy, SensorConfig, SensorLink};
