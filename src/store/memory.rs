use crate::core::error::StoreError;
use crate::core::store::{Change, Snapshot, Store};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory store; the snapshot lives as long as the process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let snapshot = self.inner.read().await;
        debug!(
            banks = snapshot.banks.len(),
            cards = snapshot.cards.len(),
            rules = snapshot.rules.len(),
            "Memory store LOAD"
        );
        Ok(snapshot.clone())
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError> {
        let mut snapshot = self.inner.write().await;
        debug!(changes = changes.len(), "Memory store COMMIT");
        for change in changes {
            snapshot.apply(change);
        }
        Ok(())
    }
}
