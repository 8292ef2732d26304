// src/sensor/ingest.rs

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::common::port::LinkPort;

/// Chunk size for one read attempt, matching the frame length so a quiet
/// link delivers one frame per read.
const CHUNK_LEN: usize = 8;

/// State shared between the ingestion thread and the consumer side.
#[derive(Debug, Default)]
pub(super) struct IngestFlags {
    /// Cooperative shutdown request, observed at the top of each loop
    /// iteration.
    pub stop: AtomicBool,
    /// Latched after an I/O fault ends the loop.
    pub fault: AtomicBool,
    /// Flush generation. Chunks stamped with an older generation were read
    /// before the flush and are dropped by the consumer.
    pub epoch: AtomicU64,
}

/// A chunk of ingested bytes, stamped with the flush generation current when
/// its read began.
pub(super) type Chunk = (u64, Vec<u8>);

/// Spawns the background reader. The loop checks the stop flag first each
/// iteration, so shutdown can lag by up to one read timeout. An I/O error
/// latches the fault flag and ends the loop; nothing escapes the thread as a
/// panic.
pub(super) fn spawn<P>(mut port: P, flags: Arc<IngestFlags>, tx: Sender<Chunk>) -> JoinHandle<()>
where
    P: LinkPort + 'static,
{
    thread::spawn(move || {
        let mut chunk = [0u8; CHUNK_LEN];
        loop {
            if flags.stop.load(Ordering::Acquire) {
                break;
            }
            let epoch = flags.epoch.load(Ordering::Acquire);
            match port.read(&mut chunk) {
                // Per-read timeout; nothing arrived.
                Ok(0) => {}
                Ok(n) => {
                    // Receiver gone means the link was closed without the
                    // stop flag; just wind down.
                    if tx.send((epoch, chunk[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("sensor ingestion stopped: {e:?}");
                    flags.fault.store(true, Ordering::Release);
                    break;
                }
            }
        }
    })
}
