//! # Backend Registry
//!
//! Runtime mapping from a storage type name to the factory that constructs
//! devices of that backend.
//!
//! ## How It Works
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     DeviceRegistry                      │
//! │                                                         │
//! │   "ram"  ──→ RamBackend                                 │
//! │   "file" ──→ FileBackend                                │
//! │   "s3"   ──→ (third-party factory, registered at init)  │
//! │                                                         │
//! └──────────────────────────┬──────────────────────────────┘
//!                            │ resolve("file")
//!                            ▼
//!                 Arc<dyn BlockDeviceFactory>
//!                            │ setup / open
//!                            ▼
//!                    Box<dyn BlockDevice>
//! ```
//!
//! Textual names let a configuration-driven caller select a backend at
//! runtime without importing concrete types, and let third parties add
//! backends without modifying this crate. Registration normally happens
//! during process initialization; the map is lock-guarded so late
//! registration cannot race resolution in a multi-threaded host.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::adapters::storage::{FileBackend, RamBackend};
use crate::domain::errors::RegistryError;
use crate::ports::factory::BlockDeviceFactory;

lazy_static! {
    static ref GLOBAL_REGISTRY: DeviceRegistry = DeviceRegistry::with_builtin();
}

/// Name-to-factory map for storage backends.
///
/// Most callers use the process-wide instance via [`DeviceRegistry::global`]
/// (or the crate-level [`register`]/[`resolve`] helpers). Independent
/// instances exist so tests and embedded hosts can build isolated registries.
pub struct DeviceRegistry {
    factories: RwLock<HashMap<String, Arc<dyn BlockDeviceFactory>>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-loaded with the built-in backends
    /// ("ram", "file").
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry
            .register(RamBackend::STORAGE_TYPE, Arc::new(RamBackend))
            .expect("empty registry accepts builtin ram backend");
        registry
            .register(FileBackend::STORAGE_TYPE, Arc::new(FileBackend))
            .expect("empty registry accepts builtin file backend");
        registry
    }

    /// The process-wide registry, created lazily on first use with the
    /// built-in backends already registered.
    pub fn global() -> &'static DeviceRegistry {
        &GLOBAL_REGISTRY
    }

    /// Bind `name` to a backend factory.
    ///
    /// ## Errors
    ///
    /// - `InvalidTypeName`: empty or all-whitespace name
    /// - `DuplicateType`: `name` is already bound; never a silent overwrite
    pub fn register(
        &self,
        name: &str,
        factory: Arc<dyn BlockDeviceFactory>,
    ) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidTypeName {
                reason: "storage type name must not be empty",
            });
        }

        let mut factories = self.factories.write();
        if factories.contains_key(name) {
            return Err(RegistryError::DuplicateType {
                name: name.to_string(),
            });
        }

        factories.insert(name.to_string(), factory);

        #[cfg(feature = "tracing-log")]
        tracing::info!("[blockvault] registered storage backend: {}", name);

        Ok(())
    }

    /// Look up the factory bound to `name`.
    ///
    /// This is the only way from a string to a backend; there is no
    /// fallback or default.
    ///
    /// ## Errors
    ///
    /// - `UnknownType`: `name` is not registered (the error carries the
    ///   currently registered names for diagnostics)
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn BlockDeviceFactory>, RegistryError> {
        let factories = self.factories.read();
        factories
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
                registered: {
                    let mut names: Vec<String> = factories.keys().cloned().collect();
                    names.sort();
                    names
                },
            })
    }

    /// Whether `name` is bound to a factory.
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Sorted list of registered storage type names.
    pub fn registered_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register a backend in the process-wide registry.
///
/// See [`DeviceRegistry::register`].
pub fn register(name: &str, factory: Arc<dyn BlockDeviceFactory>) -> Result<(), RegistryError> {
    DeviceRegistry::global().register(name, factory)
}

/// Resolve a backend from the process-wide registry.
///
/// See [`DeviceRegistry::resolve`].
pub fn resolve(name: &str) -> Result<Arc<dyn BlockDeviceFactory>, RegistryError> {
    DeviceRegistry::global().resolve(name)
}
