//! # Ram Backend
//!
//! In-memory reference backend. Images live in a process-wide named table so
//! a close/reopen cycle observes persisted state, which is what makes the
//! backend usable as a stand-in for durable ones in tests.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::domain::errors::StorageError;
use crate::domain::geometry::DeviceGeometry;
use crate::domain::metrics::IoCounters;
use crate::domain::request::SetupRequest;
use crate::ports::device::BlockDevice;
use crate::ports::factory::BlockDeviceFactory;

/// One in-memory backing resource.
struct RamImage {
    geometry: DeviceGeometry,
    header: Vec<u8>,
    /// Flat block array, `block_size * block_count` bytes.
    blocks: Vec<u8>,
}

lazy_static! {
    /// Process-wide table of named images. Entries survive device close and
    /// are dropped only by [`RamBackend::purge`].
    static ref RAM_IMAGES: Mutex<HashMap<String, Arc<Mutex<RamImage>>>> =
        Mutex::new(HashMap::new());
}

/// Factory for the `"ram"` storage type.
pub struct RamBackend;

impl RamBackend {
    /// Registry name this backend is conventionally bound to.
    pub const STORAGE_TYPE: &'static str = "ram";

    /// Whether an image exists under `storage_name`.
    pub fn exists(storage_name: &str) -> bool {
        RAM_IMAGES.lock().contains_key(storage_name)
    }

    /// Drop the image under `storage_name`. Returns whether one existed.
    ///
    /// Open devices holding the image keep operating on the detached copy.
    pub fn purge(storage_name: &str) -> bool {
        RAM_IMAGES.lock().remove(storage_name).is_some()
    }
}

impl BlockDeviceFactory for RamBackend {
    fn storage_type(&self) -> &'static str {
        Self::STORAGE_TYPE
    }

    fn setup(&self, request: SetupRequest) -> Result<Box<dyn BlockDevice>, StorageError> {
        request.validate()?;

        let mut images = RAM_IMAGES.lock();
        if images.contains_key(&request.storage_name) && !request.overwrite {
            return Err(StorageError::AlreadyExists {
                name: request.storage_name,
            });
        }

        let image = Arc::new(Mutex::new(RamImage {
            geometry: request.geometry,
            header: request.header_data.clone(),
            blocks: vec![0u8; request.geometry.payload_bytes() as usize],
        }));
        images.insert(request.storage_name.clone(), Arc::clone(&image));

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[blockvault] formatted ram device {} ({} x {} bytes)",
            request.storage_name,
            request.geometry.block_count,
            request.geometry.block_size
        );

        Ok(Box::new(RamBlockDevice {
            storage_name: request.storage_name,
            geometry: request.geometry,
            image,
            counters: IoCounters::new(),
            last_header: request.header_data,
            closed: false,
        }))
    }

    fn open(&self, storage_name: &str) -> Result<Box<dyn BlockDevice>, StorageError> {
        let image = RAM_IMAGES
            .lock()
            .get(storage_name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                name: storage_name.to_string(),
            })?;

        let (geometry, header) = {
            let locked = image.lock();
            (locked.geometry, locked.header.clone())
        };

        Ok(Box::new(RamBlockDevice {
            storage_name: storage_name.to_string(),
            geometry,
            image,
            counters: IoCounters::new(),
            last_header: header,
            closed: false,
        }))
    }

    fn compute_storage_size(&self, geometry: &DeviceGeometry) -> u64 {
        geometry.header_capacity as u64 + geometry.payload_bytes()
    }
}

/// An opened handle onto a ram image.
pub struct RamBlockDevice {
    storage_name: String,
    geometry: DeviceGeometry,
    image: Arc<Mutex<RamImage>>,
    counters: IoCounters,
    /// Header snapshot served after close.
    last_header: Vec<u8>,
    closed: bool,
}

impl BlockDevice for RamBlockDevice {
    fn storage_type(&self) -> &'static str {
        RamBackend::STORAGE_TYPE
    }

    fn storage_name(&self) -> &str {
        &self.storage_name
    }

    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn header_data(&self) -> Vec<u8> {
        if self.closed {
            self.last_header.clone()
        } else {
            self.image.lock().header.clone()
        }
    }

    fn update_header_data(&mut self, header: &[u8]) -> Result<(), StorageError> {
        self.check_open()?;
        self.geometry.check_header(header)?;

        self.image.lock().header = header.to_vec();
        self.last_header = header.to_vec();
        Ok(())
    }

    fn read_block(&mut self, index: u64) -> Result<Vec<u8>, StorageError> {
        self.check_open()?;
        self.geometry.check_index(index)?;

        let offset = self.geometry.block_offset(index) as usize;
        let data = {
            let image = self.image.lock();
            image.blocks[offset..offset + self.geometry.block_size].to_vec()
        };

        self.counters.record_read(self.geometry.block_size as u64);
        Ok(data)
    }

    fn write_block(&mut self, index: u64, data: &[u8]) -> Result<(), StorageError> {
        self.check_open()?;
        self.geometry.check_index(index)?;
        self.geometry.check_payload(data)?;

        let offset = self.geometry.block_offset(index) as usize;
        {
            let mut image = self.image.lock();
            image.blocks[offset..offset + self.geometry.block_size].copy_from_slice(data);
        }

        self.counters.record_write(self.geometry.block_size as u64);
        Ok(())
    }

    fn bytes_sent(&self) -> u64 {
        self.counters.bytes_sent()
    }

    fn bytes_received(&self) -> u64 {
        self.counters.bytes_received()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.last_header = self.image.lock().header.clone();
        self.closed = true;

        #[cfg(feature = "tracing-log")]
        tracing::debug!("[blockvault] closed ram device {}", self.storage_name);
    }

    fn clone_device(&mut self, new_name: &str) -> Result<Box<dyn BlockDevice>, StorageError> {
        self.check_open()?;

        let mut images = RAM_IMAGES.lock();
        if images.contains_key(new_name) {
            return Err(StorageError::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        let (geometry, header, copy) = {
            let source = self.image.lock();
            (source.geometry, source.header.clone(), source.blocks.clone())
        };
        let image = Arc::new(Mutex::new(RamImage {
            geometry,
            header: header.clone(),
            blocks: copy,
        }));
        images.insert(new_name.to_string(), Arc::clone(&image));

        Ok(Box::new(RamBlockDevice {
            storage_name: new_name.to_string(),
            geometry,
            image,
            counters: IoCounters::new(),
            last_header: header,
            closed: false,
        }))
    }
}

impl Drop for RamBlockDevice {
    fn drop(&mut self) {
        self.close();
    }
}
