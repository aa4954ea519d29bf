//! Shared helpers for in-crate unit tests.

use std::sync::atomic::{AtomicU64, Ordering};

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produce a storage name unique within this process.
///
/// Ram images live in a process-wide table, so parallel tests must not
/// share names.
pub fn unique_name(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        std::process::id(),
        NAME_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}
