//! # Setup Requests
//!
//! Value object describing how to create a fresh backing resource.
//!
//! All configuration values have sensible defaults; callers override them
//! with the builder methods.

use crate::domain::errors::StorageError;
use crate::domain::geometry::DeviceGeometry;

/// Parameters for formatting a new block device.
///
/// ## Defaults
///
/// - empty initial header
/// - header capacity of [`DeviceGeometry::DEFAULT_HEADER_CAPACITY`] bytes
/// - `overwrite` off: setup fails with `AlreadyExists` if something already
///   occupies `storage_name` (INVARIANT-7)
#[derive(Debug, Clone)]
pub struct SetupRequest {
    /// Backend-interpreted identifier for the backing resource. The file
    /// backend treats it as a path; the ram backend as a table key.
    pub storage_name: String,

    /// Shape of the new device.
    pub geometry: DeviceGeometry,

    /// Initial header contents, stored as given.
    pub header_data: Vec<u8>,

    /// Replace an existing resource instead of failing.
    pub overwrite: bool,
}

impl SetupRequest {
    /// Create a request with defaults for everything but the geometry.
    pub fn new(storage_name: impl Into<String>, block_size: usize, block_count: u64) -> Self {
        Self {
            storage_name: storage_name.into(),
            geometry: DeviceGeometry::new(block_size, block_count),
            header_data: Vec::new(),
            overwrite: false,
        }
    }

    /// Set the initial header contents.
    ///
    /// The header must fit within the header capacity; `validate` enforces
    /// this, it is not grown automatically.
    pub fn with_header(mut self, header: impl Into<Vec<u8>>) -> Self {
        self.header_data = header.into();
        self
    }

    /// Set the header capacity reserved in the backing resource.
    pub fn with_header_capacity(mut self, capacity: usize) -> Self {
        self.geometry.header_capacity = capacity;
        self
    }

    /// Allow setup to replace an existing resource.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate the request before any resource is created.
    ///
    /// ## Errors
    ///
    /// - `InvalidGeometry`: zero block size
    /// - `HeaderTooLarge`: initial header exceeds the header capacity
    pub fn validate(&self) -> Result<(), StorageError> {
        self.geometry.validate()?;
        self.geometry.check_header(&self.header_data)
    }
}
