//! # Device Port
//!
//! The abstract capability set every concrete block device must support.
//!
//! Higher-level code (caching layers, encrypted containers, oblivious-RAM
//! schemes) programs against [`BlockDevice`] and never against a concrete
//! backend. The contract is synchronous and single-caller: reads and writes
//! take `&mut self`, and callers needing concurrency serialize access
//! externally or open independent instances where the backend allows it.

use crate::domain::errors::StorageError;
use crate::domain::geometry::DeviceGeometry;

/// An opened handle to a block-addressable resource.
///
/// ## Lifecycle
///
/// A device is **Open** from construction until [`close`](Self::close), then
/// **Closed** forever. Closing is idempotent (INVARIANT-6); every other
/// operation on a closed device fails with `DeviceClosed`. Geometry, name,
/// counters, and the last-known header stay readable after close for
/// diagnostics.
///
/// ## Ordering
///
/// Operations issued sequentially on one instance observe a total order
/// matching call order. Nothing is guaranteed across two instances over the
/// same physical resource; concurrent writers through separate instances are
/// unsupported.
pub trait BlockDevice: Send {
    /// The registry type name of the backend that produced this device.
    fn storage_type(&self) -> &'static str;

    /// Identifying name of the backing resource, for diagnostics.
    fn storage_name(&self) -> &str;

    /// The fixed shape of this device (INVARIANT-1).
    fn geometry(&self) -> DeviceGeometry;

    /// Size in bytes of one block.
    fn block_size(&self) -> usize {
        self.geometry().block_size
    }

    /// Number of addressable blocks.
    fn block_count(&self) -> u64 {
        self.geometry().block_count
    }

    /// Whether [`close`](Self::close) has run.
    fn is_closed(&self) -> bool;

    /// Current header contents (last-known values once closed).
    fn header_data(&self) -> Vec<u8>;

    /// Replace the header contents (INVARIANT-5).
    ///
    /// ## Errors
    ///
    /// - `HeaderTooLarge`: payload exceeds the capacity declared at setup
    /// - `DeviceClosed`: the device has been closed
    fn update_header_data(&mut self, header: &[u8]) -> Result<(), StorageError>;

    /// Read one block.
    ///
    /// Adds `block_size` to `bytes_received` on success.
    ///
    /// ## Errors
    ///
    /// - `IndexOutOfRange`: `index >= block_count`
    /// - `DeviceClosed`: the device has been closed
    fn read_block(&mut self, index: u64) -> Result<Vec<u8>, StorageError>;

    /// Write one block. `data` must be exactly `block_size` bytes.
    ///
    /// Adds `block_size` to `bytes_sent` on success. Durability is whatever
    /// the backend provides; no atomicity across blocks is implied.
    ///
    /// ## Errors
    ///
    /// - `IndexOutOfRange`: `index >= block_count`
    /// - `BlockSizeMismatch`: wrong payload length
    /// - `DeviceClosed`: the device has been closed
    fn write_block(&mut self, index: u64, data: &[u8]) -> Result<(), StorageError>;

    /// Read a batch of blocks, in input order.
    ///
    /// ## Atomicity (INVARIANT-4)
    ///
    /// The whole batch is validated before any block is read; one invalid
    /// index fails the entire call.
    fn read_blocks(&mut self, indices: &[u64]) -> Result<Vec<Vec<u8>>, StorageError> {
        self.check_open()?;
        let geometry = self.geometry();
        for &index in indices {
            geometry.check_index(index)?;
        }

        let mut blocks = Vec::with_capacity(indices.len());
        for &index in indices {
            blocks.push(self.read_block(index)?);
        }
        Ok(blocks)
    }

    /// Write a batch of blocks, pairing `indices[i]` with `blocks[i]`.
    ///
    /// ## Atomicity (INVARIANT-4)
    ///
    /// Every index and payload is validated before the backing resource is
    /// touched; one invalid element fails the entire call and no block is
    /// written.
    fn write_blocks(&mut self, indices: &[u64], blocks: &[&[u8]]) -> Result<(), StorageError> {
        self.check_open()?;
        if indices.len() != blocks.len() {
            return Err(StorageError::BatchLengthMismatch {
                indices: indices.len(),
                blocks: blocks.len(),
            });
        }

        let geometry = self.geometry();
        for (&index, data) in indices.iter().zip(blocks) {
            geometry.check_index(index)?;
            geometry.check_payload(data)?;
        }

        for (&index, data) in indices.iter().zip(blocks) {
            self.write_block(index, data)?;
        }
        Ok(())
    }

    /// Bytes written to the backing resource since construction.
    fn bytes_sent(&self) -> u64;

    /// Bytes read from the backing resource since construction.
    fn bytes_received(&self) -> u64;

    /// Release the backing resource.
    ///
    /// Idempotent: a second call is a no-op, never an error. Flush failures
    /// during close are logged, not raised. Devices also close on drop.
    fn close(&mut self);

    /// Copy the full contents (all blocks + header) to a new resource on the
    /// same backend and return an open device for it.
    ///
    /// ## Errors
    ///
    /// - `AlreadyExists`: something already occupies `new_name`
    /// - `DeviceClosed`: the source device has been closed
    fn clone_device(&mut self, new_name: &str) -> Result<Box<dyn BlockDevice>, StorageError>;

    /// Fail with `DeviceClosed` unless the device is open.
    fn check_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            return Err(StorageError::DeviceClosed {
                name: self.storage_name().to_string(),
            });
        }
        Ok(())
    }
}

/// Streaming reads over a device, without materializing every block at once.
pub trait BlockDeviceExt: BlockDevice {
    /// Lazily read `indices`, yielding `(index, bytes)` pairs in input order.
    ///
    /// Indices are validated eagerly, before the first block is fetched;
    /// payloads are read one at a time as the stream is advanced. The stream
    /// is single-pass and borrows the device exclusively for its lifetime.
    ///
    /// ## Errors
    ///
    /// - `IndexOutOfRange`: any index is out of bounds (no block is read)
    /// - `DeviceClosed`: the device has been closed
    fn yield_blocks(&mut self, indices: Vec<u64>) -> Result<BlockStream<'_, Self>, StorageError> {
        BlockStream::new(self, indices)
    }
}

impl<D: BlockDevice + ?Sized> BlockDeviceExt for D {}

/// Single-pass iterator over `(index, bytes)` pairs of a device.
///
/// Produced by [`BlockDeviceExt::yield_blocks`]. Bounded by the number of
/// requested indices; not restartable.
pub struct BlockStream<'d, D: BlockDevice + ?Sized> {
    device: &'d mut D,
    indices: std::vec::IntoIter<u64>,
}

impl<'d, D: BlockDevice + ?Sized> BlockStream<'d, D> {
    fn new(device: &'d mut D, indices: Vec<u64>) -> Result<Self, StorageError> {
        device.check_open()?;
        let geometry = device.geometry();
        for &index in &indices {
            geometry.check_index(index)?;
        }
        Ok(Self {
            device,
            indices: indices.into_iter(),
        })
    }

    /// Blocks not yet yielded.
    pub fn remaining(&self) -> usize {
        self.indices.len()
    }
}

impl<D: BlockDevice + ?Sized> Iterator for BlockStream<'_, D> {
    type Item = Result<(u64, Vec<u8>), StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        Some(self.device.read_block(index).map(|data| (index, data)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}
