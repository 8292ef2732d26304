// src/common/timing.rs

use core::time::Duration;

// === Port configuration ===

/// Sensor-module baud rate.
pub const SENSOR_BAUD: u32 = 115_200;
/// Motion-controller baud rate.
pub const MOTION_BAUD: u32 = 57_600;

/// Per-read timeout on the sensor port. Also bounds how far a cooperative
/// shutdown can lag behind the stop flag.
pub const SENSOR_READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Per-read timeout on the motion port. Read-count budgets below are only
/// meaningful relative to this value.
pub const MOTION_READ_TIMEOUT: Duration = Duration::from_millis(10);

// === Sensor-side defaults ===

/// Default deadline for one consumer-side wait (a frame fill or a register
/// exchange).
pub const DEFAULT_SENSOR_WAIT: Duration = Duration::from_secs(5);

/// Default budget of consecutive shifted bytes before frame
/// resynchronization is reported lost.
pub const DEFAULT_RESYNC_BUDGET: usize = 4096;

// === Motion-side defaults ===

/// Read attempts allowed while scanning one position report.
pub const DEFAULT_SCAN_READS: u32 = 4096;

/// Read budget while waiting for `ok` after a tool select or M400. Tool
/// changes move real hardware, so this is generous.
pub const SELECT_ACK_READS: u32 = 10_000;
/// Read budget while waiting for `ok` after a G10 offset line.
pub const OFFSET_ACK_READS: u32 = 1_000;
