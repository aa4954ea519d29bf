//! # BlockVault Test Suite
//!
//! Unified test crate for the workspace.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Shared fixtures (backend cases, names, payloads)
//! │
//! └── integration/      # Contract tests run against every backend
//!     ├── registry.rs   # Backend registration and resolution
//!     ├── lifecycle.rs  # Setup/open/close round trips
//!     └── validation.rs # Addressing, batches, streams, cloning, sizing
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p blockvault-tests
//!
//! # By category
//! cargo test -p blockvault-tests integration::lifecycle::
//!
//! # Benchmarks
//! cargo bench -p blockvault-tests
//! ```

#![allow(dead_code)]

pub mod integration;
