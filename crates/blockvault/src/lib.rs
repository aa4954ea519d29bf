//! # BlockVault
//!
//! A block-storage abstraction layer with a pluggable backend registry.
//!
//! Higher-level code (caching layers, encrypted containers, oblivious-RAM
//! schemes) treats any backend uniformly: resolve a factory by name, open or
//! format a device through it, then use only the abstract contract.
//!
//! ## Architecture
//!
//! ```text
//! caller ──resolve("file")──→ DeviceRegistry
//!                                  │
//!                                  ▼
//!                      Arc<dyn BlockDeviceFactory>
//!                                  │ setup / open
//!                                  ▼
//!                        Box<dyn BlockDevice>
//!                                  │ read/write/header/close
//!                                  ▼
//!                  backend-owned backing resource
//! ```
//!
//! ## Contract Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Fixed Geometry | block_size and block_count never change for an open device |
//! | 2 | Bounded Addressing | indices validated against block_count before any I/O |
//! | 3 | Exact Block Size | write payloads must equal block_size exactly |
//! | 4 | Atomic Batches | batch operations validate fully before touching the resource |
//! | 5 | Header Round-Trip | header survives a write/close/reopen cycle byte-exact |
//! | 6 | Idempotent Close | close may run twice; later operations fail with a typed error |
//! | 7 | Explicit Existence | setup never clobbers an existing resource unless told to |
//!
//! ## Crate Structure
//!
//! - `domain/` - Pure domain logic (errors, geometry, requests, counters)
//! - `ports/` - Port traits (device contract, factory contract)
//! - `adapters/` - Built-in reference backends ("ram", "file")
//! - `registry/` - Name-to-factory map for runtime backend selection
//!
//! ## Usage
//!
//! ```ignore
//! use blockvault::{BlockDeviceExt, DeviceRegistry, SetupRequest};
//!
//! let factory = DeviceRegistry::global().resolve("ram")?;
//! let mut dev = factory.setup(
//!     SetupRequest::new("t1", 16, 4).with_header(b"hdr".to_vec()),
//! )?;
//!
//! dev.write_block(2, b"0123456789ABCDEF")?;
//! assert_eq!(dev.read_block(2)?, b"0123456789ABCDEF");
//!
//! dev.update_header_data(b"new-header-bytes")?;
//! dev.close();
//!
//! let mut dev = factory.open("t1")?;
//! assert_eq!(dev.header_data(), b"new-header-bytes");
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod registry;

#[cfg(test)]
mod test_utils;

// Re-export key types for convenience
pub use adapters::storage::{FileBackend, FileBlockDevice, RamBackend, RamBlockDevice};
pub use domain::errors::{RegistryError, StorageError};
pub use domain::geometry::DeviceGeometry;
pub use domain::metrics::IoCounters;
pub use domain::request::SetupRequest;
pub use ports::device::{BlockDevice, BlockDeviceExt, BlockStream};
pub use ports::factory::BlockDeviceFactory;
pub use registry::{register, resolve, DeviceRegistry};
