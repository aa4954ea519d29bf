//! # Adapters
//!
//! Concrete implementations of the ports. Third-party backends live outside
//! this crate and plug in through the registry; only the reference backends
//! ship here.

pub mod storage;
