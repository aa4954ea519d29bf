//! # File Backend
//!
//! Single-file reference backend. The on-disk layout is self-describing:
//!
//! ```text
//! [superblock: 64 bytes][header region: header_capacity bytes][blocks]
//! ```
//!
//! The superblock is a bincode-encoded fixed-width struct followed by a
//! CRC32 of the encoded bytes, padded to 64 bytes. Opening verifies the
//! magic, format version, checksum, and that the file length matches the
//! self-described geometry; any mismatch is reported as `Corrupt`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::StorageError;
use crate::domain::geometry::DeviceGeometry;
use crate::domain::metrics::IoCounters;
use crate::domain::request::SetupRequest;
use crate::ports::device::BlockDevice;
use crate::ports::factory::BlockDeviceFactory;

const SUPERBLOCK_MAGIC: [u8; 8] = *b"BLKVAULT";
const FORMAT_VERSION: u16 = 1;

/// bincode fixint encoding: 8 (magic) + 2 (version) + 4 * 8 (u64 fields).
const SUPERBLOCK_ENCODED_LEN: usize = 42;

/// Size of the reserved superblock region at the start of the file.
pub const SUPERBLOCK_BYTES: u64 = 64;

/// Chunk size for block-region copies during cloning.
const COPY_CHUNK: usize = 64 * 1024;

/// Self-describing metadata at the start of every file device.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Superblock {
    magic: [u8; 8],
    version: u16,
    block_size: u64,
    block_count: u64,
    header_capacity: u64,
    header_len: u64,
}

impl Superblock {
    fn new(geometry: &DeviceGeometry, header_len: usize) -> Self {
        Self {
            magic: SUPERBLOCK_MAGIC,
            version: FORMAT_VERSION,
            block_size: geometry.block_size as u64,
            block_count: geometry.block_count,
            header_capacity: geometry.header_capacity as u64,
            header_len: header_len as u64,
        }
    }

    fn encode(&self) -> Result<[u8; SUPERBLOCK_BYTES as usize], StorageError> {
        let body = bincode::serialize(self).map_err(|e| StorageError::Io {
            message: e.to_string(),
        })?;
        debug_assert_eq!(body.len(), SUPERBLOCK_ENCODED_LEN);

        let mut region = [0u8; SUPERBLOCK_BYTES as usize];
        region[..body.len()].copy_from_slice(&body);
        let crc = crc32fast::hash(&body);
        region[SUPERBLOCK_ENCODED_LEN..SUPERBLOCK_ENCODED_LEN + 4]
            .copy_from_slice(&crc.to_le_bytes());
        Ok(region)
    }

    fn decode(
        storage_name: &str,
        region: &[u8; SUPERBLOCK_BYTES as usize],
    ) -> Result<Self, StorageError> {
        let corrupt = |reason: String| StorageError::Corrupt {
            name: storage_name.to_string(),
            reason,
        };

        if region[..SUPERBLOCK_MAGIC.len()] != SUPERBLOCK_MAGIC {
            return Err(corrupt("not a block device file (bad magic)".to_string()));
        }

        let body = &region[..SUPERBLOCK_ENCODED_LEN];
        let stored_crc = u32::from_le_bytes([
            region[SUPERBLOCK_ENCODED_LEN],
            region[SUPERBLOCK_ENCODED_LEN + 1],
            region[SUPERBLOCK_ENCODED_LEN + 2],
            region[SUPERBLOCK_ENCODED_LEN + 3],
        ]);
        let computed_crc = crc32fast::hash(body);
        if stored_crc != computed_crc {
            return Err(corrupt(format!(
                "superblock checksum mismatch: stored {:08x}, computed {:08x}",
                stored_crc, computed_crc
            )));
        }

        let superblock: Superblock = bincode::deserialize(body)
            .map_err(|e| corrupt(format!("superblock undecodable: {}", e)))?;

        if superblock.version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                superblock.version
            )));
        }
        if superblock.header_len > superblock.header_capacity {
            return Err(corrupt(format!(
                "header length {} exceeds capacity {}",
                superblock.header_len, superblock.header_capacity
            )));
        }
        Ok(superblock)
    }

    fn geometry(&self, storage_name: &str) -> Result<DeviceGeometry, StorageError> {
        let corrupt = |reason: &'static str| StorageError::Corrupt {
            name: storage_name.to_string(),
            reason: reason.to_string(),
        };

        let block_size = usize::try_from(self.block_size)
            .map_err(|_| corrupt("block size does not fit this platform"))?;
        let header_capacity = usize::try_from(self.header_capacity)
            .map_err(|_| corrupt("header capacity does not fit this platform"))?;

        let geometry = DeviceGeometry {
            block_size,
            block_count: self.block_count,
            header_capacity,
        };
        geometry
            .validate()
            .map_err(|_| corrupt("superblock describes a zero block size"))?;
        Ok(geometry)
    }
}

#[cfg(feature = "locking")]
fn lock_exclusive(file: &File, storage_name: &str) -> Result<(), StorageError> {
    use fs2::FileExt;

    file.try_lock_exclusive()
        .map_err(|e| StorageError::Locked {
            name: storage_name.to_string(),
            message: e.to_string(),
        })
}

/// Factory for the `"file"` storage type.
///
/// `storage_name` is interpreted as a filesystem path; parent directories
/// are created on setup. With the `locking` feature the backing file is held
/// under an exclusive advisory lock for the lifetime of the device, so a
/// second open of the same path fails with `Locked` instead of producing two
/// writers. The lock is released when the device closes (or drops).
pub struct FileBackend;

impl FileBackend {
    /// Registry name this backend is conventionally bound to.
    pub const STORAGE_TYPE: &'static str = "file";

    fn size_for(geometry: &DeviceGeometry) -> u64 {
        SUPERBLOCK_BYTES + geometry.header_capacity as u64 + geometry.payload_bytes()
    }

    fn setup_device(&self, request: SetupRequest) -> Result<FileBlockDevice, StorageError> {
        request.validate()?;

        let path = PathBuf::from(&request.storage_name);
        if path.exists() && !request.overwrite {
            return Err(StorageError::AlreadyExists {
                name: request.storage_name,
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        #[cfg(feature = "locking")]
        lock_exclusive(&file, &request.storage_name)?;

        // set_len zero-fills, which is exactly the freshly-formatted state.
        file.set_len(Self::size_for(&request.geometry))?;

        let superblock = Superblock::new(&request.geometry, request.header_data.len());
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&superblock.encode()?)?;
        if !request.header_data.is_empty() {
            file.seek(SeekFrom::Start(SUPERBLOCK_BYTES))?;
            file.write_all(&request.header_data)?;
        }
        file.sync_all()?;

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[blockvault] 💾 formatted file device {} ({} bytes)",
            request.storage_name,
            Self::size_for(&request.geometry)
        );

        Ok(FileBlockDevice {
            storage_name: request.storage_name,
            geometry: request.geometry,
            header: request.header_data,
            file: Some(file),
            counters: IoCounters::new(),
        })
    }
}

impl BlockDeviceFactory for FileBackend {
    fn storage_type(&self) -> &'static str {
        Self::STORAGE_TYPE
    }

    fn setup(&self, request: SetupRequest) -> Result<Box<dyn BlockDevice>, StorageError> {
        Ok(Box::new(self.setup_device(request)?))
    }

    fn open(&self, storage_name: &str) -> Result<Box<dyn BlockDevice>, StorageError> {
        let path = Path::new(storage_name);
        let mut file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    name: storage_name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        #[cfg(feature = "locking")]
        lock_exclusive(&file, storage_name)?;

        let mut region = [0u8; SUPERBLOCK_BYTES as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut region)
            .map_err(|e| StorageError::Corrupt {
                name: storage_name.to_string(),
                reason: format!("superblock truncated: {}", e),
            })?;

        let superblock = Superblock::decode(storage_name, &region)?;
        let geometry = superblock.geometry(storage_name)?;

        let expected_len = Self::size_for(&geometry);
        let actual_len = file.metadata()?.len();
        if actual_len != expected_len {
            return Err(StorageError::Corrupt {
                name: storage_name.to_string(),
                reason: format!(
                    "file is {} bytes, self-described geometry requires {}",
                    actual_len, expected_len
                ),
            });
        }

        let mut header = vec![0u8; superblock.header_len as usize];
        if !header.is_empty() {
            file.seek(SeekFrom::Start(SUPERBLOCK_BYTES))?;
            file.read_exact(&mut header)?;
        }

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[blockvault] 💾 opened file device {} ({} x {} bytes)",
            storage_name,
            geometry.block_count,
            geometry.block_size
        );

        Ok(Box::new(FileBlockDevice {
            storage_name: storage_name.to_string(),
            geometry,
            header,
            file: Some(file),
            counters: IoCounters::new(),
        }))
    }

    fn compute_storage_size(&self, geometry: &DeviceGeometry) -> u64 {
        Self::size_for(geometry)
    }
}

/// An opened handle onto a file device.
pub struct FileBlockDevice {
    storage_name: String,
    geometry: DeviceGeometry,
    /// Current header contents (last-known values once closed).
    header: Vec<u8>,
    /// `None` once closed; dropping the handle releases the advisory lock.
    file: Option<File>,
    counters: IoCounters,
}

impl FileBlockDevice {
    fn block_region(&self) -> u64 {
        SUPERBLOCK_BYTES + self.geometry.header_capacity as u64
    }

    fn file_mut(&mut self) -> Result<&mut File, StorageError> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(StorageError::DeviceClosed {
                name: self.storage_name.clone(),
            }),
        }
    }

    fn rewrite_superblock(&mut self) -> Result<(), StorageError> {
        let region = Superblock::new(&self.geometry, self.header.len()).encode()?;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&region)?;
        Ok(())
    }
}

impl BlockDevice for FileBlockDevice {
    fn storage_type(&self) -> &'static str {
        FileBackend::STORAGE_TYPE
    }

    fn storage_name(&self) -> &str {
        &self.storage_name
    }

    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn header_data(&self) -> Vec<u8> {
        self.header.clone()
    }

    fn update_header_data(&mut self, header: &[u8]) -> Result<(), StorageError> {
        self.check_open()?;
        self.geometry.check_header(header)?;

        {
            let file = self.file_mut()?;
            file.seek(SeekFrom::Start(SUPERBLOCK_BYTES))?;
            file.write_all(header)?;
        }
        self.header = header.to_vec();
        // The superblock tracks the live header length.
        self.rewrite_superblock()
    }

    fn read_block(&mut self, index: u64) -> Result<Vec<u8>, StorageError> {
        self.check_open()?;
        self.geometry.check_index(index)?;

        let offset = self.block_region() + self.geometry.block_offset(index);
        let block_size = self.geometry.block_size;

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; block_size];
        file.read_exact(&mut data)?;

        self.counters.record_read(block_size as u64);
        Ok(data)
    }

    fn write_block(&mut self, index: u64, data: &[u8]) -> Result<(), StorageError> {
        self.check_open()?;
        self.geometry.check_index(index)?;
        self.geometry.check_payload(data)?;

        let offset = self.block_region() + self.geometry.block_offset(index);
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

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
        if let Some(file) = self.file.take() {
            if let Err(_e) = file.sync_all() {
                #[cfg(feature = "tracing-log")]
                tracing::warn!(
                    "[blockvault] flush on close failed for {}: {}",
                    self.storage_name,
                    _e
                );
            }

            #[cfg(feature = "tracing-log")]
            tracing::debug!("[blockvault] closed file device {}", self.storage_name);
        }
    }

    fn clone_device(&mut self, new_name: &str) -> Result<Box<dyn BlockDevice>, StorageError> {
        self.check_open()?;

        if Path::new(new_name).exists() {
            return Err(StorageError::AlreadyExists {
                name: new_name.to_string(),
            });
        }

        let request = SetupRequest::new(new_name, self.geometry.block_size, self.geometry.block_count)
            .with_header_capacity(self.geometry.header_capacity)
            .with_header(self.header.clone());
        let mut clone = FileBackend.setup_device(request)?;

        // Raw copy of the block region; both layouts are identical.
        let source_offset = self.block_region();
        let clone_offset = clone.block_region();
        let mut remaining = self.geometry.payload_bytes();
        let mut chunk = vec![0u8; COPY_CHUNK];

        let source = self.file_mut()?;
        source.seek(SeekFrom::Start(source_offset))?;
        let destination = clone.file_mut()?;
        destination.seek(SeekFrom::Start(clone_offset))?;

        while remaining > 0 {
            let step = remaining.min(COPY_CHUNK as u64) as usize;
            source.read_exact(&mut chunk[..step])?;
            destination.write_all(&chunk[..step])?;
            remaining -= step as u64;
        }
        destination.sync_all()?;

        Ok(Box::new(clone))
    }
}

impl Drop for FileBlockDevice {
    fn drop(&mut self) {
        self.close();
    }
}
