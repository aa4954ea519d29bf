//! # I/O Counters
//!
//! Per-device traffic accounting. Counters are monotonically increasing and
//! reset only when the device is constructed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Traffic counters for one device instance.
///
/// Writes add to `bytes_sent`, reads add to `bytes_received`, both in units
/// of whole blocks. Atomics keep the accessors usable from diagnostics
/// threads without exclusive access to the device.
#[derive(Debug, Default)]
pub struct IoCounters {
    /// Bytes written to the backing resource.
    bytes_sent: AtomicU64,
    /// Bytes read from the backing resource.
    bytes_received: AtomicU64,
    /// Completed single-block read operations.
    read_ops: AtomicU64,
    /// Completed single-block write operations.
    write_ops: AtomicU64,
}

impl IoCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed block read.
    pub fn record_read(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.read_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed block write.
    pub fn record_write(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
        self.write_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bytes written so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Total bytes read so far.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Completed read operations.
    pub fn read_ops(&self) -> u64 {
        self.read_ops.load(Ordering::Relaxed)
    }

    /// Completed write operations.
    pub fn write_ops(&self) -> u64 {
        self.write_ops.load(Ordering::Relaxed)
    }
}
