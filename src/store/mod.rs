pub mod disk;
pub mod memory;

use crate::core::config::{AppConfig, StorageBackend};
use crate::core::store::Store;
use anyhow::{Context, Result};
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the storage backend selected in the config.
pub fn open(config: &AppConfig) -> Result<Arc<dyn Store>> {
    match config.storage {
        StorageBackend::Memory => {
            debug!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Disk => {
            let path = config.default_data_path()?.join("db");
            let store = DiskStore::open(&path)
                .with_context(|| format!("Failed to open data store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
