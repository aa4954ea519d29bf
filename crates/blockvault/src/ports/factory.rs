//! # Factory Port
//!
//! Class-level operations of a backend: formatting a new resource, opening
//! an existing one, and sizing a resource before it exists.
//!
//! Factories are what the registry hands out. Because both the factory and
//! the devices it produces are trait objects, a structurally incomplete
//! backend is a compile-time error, not something to probe for at
//! registration time.

use crate::domain::errors::StorageError;
use crate::domain::geometry::DeviceGeometry;
use crate::domain::request::SetupRequest;
use crate::ports::device::BlockDevice;

/// Constructor-side contract of a storage backend.
pub trait BlockDeviceFactory: Send + Sync {
    /// The registry type name this backend is conventionally bound to.
    fn storage_type(&self) -> &'static str;

    /// Create and initialize a fresh backing resource.
    ///
    /// All blocks are zero-filled; the initial header is stored as given.
    /// The returned device is Open.
    ///
    /// ## Errors
    ///
    /// - `AlreadyExists`: `storage_name` is occupied and `overwrite` is off
    ///   (INVARIANT-7)
    /// - `InvalidGeometry` / `HeaderTooLarge`: the request fails validation
    /// - `Locked`: the resource is held by another process
    /// - `Io`: backend I/O failure
    fn setup(&self, request: SetupRequest) -> Result<Box<dyn BlockDevice>, StorageError>;

    /// Open an existing backing resource. The returned device is Open.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: nothing exists under `storage_name`
    /// - `Corrupt`: the resource structure is unreadable or inconsistent
    ///   with its self-described geometry
    /// - `Locked`: the resource is held by another device instance
    /// - `Io`: backend I/O failure
    fn open(&self, storage_name: &str) -> Result<Box<dyn BlockDevice>, StorageError>;

    /// Total bytes a resource with this geometry occupies on this backend.
    ///
    /// Pure: callable before any device exists, used to pre-allocate or
    /// validate available space. Each backend declares its exact formula and
    /// tests it against the real resource size.
    fn compute_storage_size(&self, geometry: &DeviceGeometry) -> u64;
}
