// src/common/serial.rs
//
// Real-port backend. Everything above this file is generic over `LinkPort`,
// so this stays the only module that touches `serialport`.

use std::io::{self, Read, Write};

use serialport::SerialPort;

use crate::common::port::LinkPort;
use crate::common::timing;

impl LinkPort for Box<dyn SerialPort> {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        match Read::read(self, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), io::Error> {
        Write::write_all(self, bytes)?;
        Write::flush(self)
    }

    fn discard_input(&mut self) -> Result<(), io::Error> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn try_clone(&self) -> Result<Self, io::Error> {
        SerialPort::try_clone(&**self).map_err(io::Error::from)
    }
}

/// Opens the sensor-module port: 115200 baud, 1 s per-read timeout. A failed
/// open is retried once before the error is surfaced.
pub fn open_sensor_port(path: &str) -> Result<Box<dyn SerialPort>, serialport::Error> {
    let build = || {
        serialport::new(path, timing::SENSOR_BAUD)
            .timeout(timing::SENSOR_READ_TIMEOUT)
            .open()
    };
    build().or_else(|e| {
        log::warn!("sensor port {path} failed to open ({e}), retrying once");
        build()
    })
}

/// Opens the motion-controller port: 57600 baud, 10 ms per-read timeout.
pub fn open_motion_port(path: &str) -> Result<Box<dyn SerialPort>, serialport::Error> {
    serialport::new(path, timing::MOTION_BAUD)
        .timeout(timing::MOTION_READ_TIMEOUT)
        .open()
}
