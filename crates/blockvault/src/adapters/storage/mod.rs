//! Storage Adapters
//!
//! The built-in backends implementing the device and factory ports.

mod file;
mod memory;

pub use file::{FileBackend, FileBlockDevice, SUPERBLOCK_BYTES};
pub use memory::{RamBackend, RamBlockDevice};
