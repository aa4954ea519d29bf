//! # Domain Errors
//!
//! Error types for the block-storage abstraction.
//!
//! ## Design Principles
//!
//! - Each error maps to a specific contract violation or failure mode
//! - Backend-specific failures (I/O, locking) are mapped to backend-agnostic
//!   variants so callers can match on kind regardless of backend
//! - No panics in library code (use Result instead)

use thiserror::Error;

/// Errors that can occur while operating on a block device or its backing
/// resource.
///
/// Construction-time variants (`AlreadyExists`, `NotFound`, `Corrupt`,
/// `Locked`) are fatal to that attempt; the contract implies no retry.
/// Validation variants (`IndexOutOfRange`, `BlockSizeMismatch`,
/// `BatchLengthMismatch`, `HeaderTooLarge`, `InvalidGeometry`) are raised
/// before the backing resource is touched and are never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Something already occupies the target storage name (INVARIANT-7).
    #[error("storage already exists: {name}")]
    AlreadyExists { name: String },

    /// No backing resource exists under this storage name.
    #[error("storage not found: {name}")]
    NotFound { name: String },

    /// The backing resource is unreadable or self-inconsistent.
    #[error("corrupt storage {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// Block index outside `0..block_count` (INVARIANT-2).
    #[error("block index {index} out of range: device has {block_count} blocks")]
    IndexOutOfRange { index: u64, block_count: u64 },

    /// Write payload length does not equal the device block size (INVARIANT-3).
    #[error("block payload is {actual} bytes, device block size is {expected}")]
    BlockSizeMismatch { expected: usize, actual: usize },

    /// Batch index and payload lists have different lengths (INVARIANT-4).
    #[error("batch length mismatch: {indices} indices, {blocks} payloads")]
    BatchLengthMismatch { indices: usize, blocks: usize },

    /// Header exceeds the capacity declared at setup time.
    #[error("header is {len} bytes, capacity is {capacity}")]
    HeaderTooLarge { len: usize, capacity: usize },

    /// Geometry rejected before any resource was created.
    #[error("invalid device geometry: {reason}")]
    InvalidGeometry { reason: &'static str },

    /// Operation attempted on a closed device (INVARIANT-6).
    #[error("device is closed: {name}")]
    DeviceClosed { name: String },

    /// The backing resource is held by another device instance or process.
    #[error("storage locked: {name}: {message}")]
    Locked { name: String, message: String },

    /// Backend I/O failure, mapped to a backend-agnostic variant.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

/// Errors raised by the backend registry.
///
/// These are configuration errors: raised immediately, surfaced
/// synchronously, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The storage type name is already bound to a factory.
    ///
    /// Registration is never a silent overwrite.
    #[error("storage type already registered: {name}")]
    DuplicateType { name: String },

    /// No factory is bound to this storage type name.
    ///
    /// There is no fallback or default backend.
    #[error("unknown storage type: {name} (registered: {registered:?})")]
    UnknownType {
        name: String,
        registered: Vec<String>,
    },

    /// The storage type name itself is malformed.
    #[error("invalid storage type name: {reason}")]
    InvalidTypeName { reason: &'static str },
}
