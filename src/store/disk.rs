use crate::core::error::StoreError;
use crate::core::store::{Change, Entity, EntityKey, Snapshot, Store};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const BANKS: &str = "banks";
const CARDS: &str = "cards";
const RULES: &str = "rules";

/// Store backed by a fjall keyspace with one partition per record kind.
///
/// Keys and records are JSON encoded. A commit is written as one batch so it
/// lands on disk in full or not at all.
pub struct DiskStore {
    keyspace: Keyspace,
    banks: PartitionHandle,
    cards: PartitionHandle,
    rules: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path).open()?;
        let banks = keyspace.open_partition(BANKS, PartitionCreateOptions::default())?;
        let cards = keyspace.open_partition(CARDS, PartitionCreateOptions::default())?;
        let rules = keyspace.open_partition(RULES, PartitionCreateOptions::default())?;
        debug!("Opened disk store at {}", path.display());

        Ok(Self {
            keyspace,
            banks,
            cards,
            rules,
        })
    }

    fn read_partition<K, V>(partition: &PartitionHandle) -> Result<BTreeMap<K, V>, StoreError>
    where
        K: Ord + DeserializeOwned,
        V: DeserializeOwned,
    {
        let mut records = BTreeMap::new();
        for item in partition.iter() {
            let (key, value) = item?;
            records.insert(serde_json::from_slice(&key)?, serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(value)?)
}

#[async_trait]
impl Store for DiskStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot {
            banks: Self::read_partition(&self.banks)?,
            cards: Self::read_partition(&self.cards)?,
            rules: Self::read_partition(&self.rules)?,
        };
        debug!(
            banks = snapshot.banks.len(),
            cards = snapshot.cards.len(),
            rules = snapshot.rules.len(),
            "Disk store LOAD"
        );
        Ok(snapshot)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut batch = self.keyspace.batch();
        for change in &changes {
            match change {
                Change::Put(Entity::Bank(bank)) => {
                    batch.insert(&self.banks, encode(&bank.name)?, encode(bank)?)
                }
                Change::Put(Entity::Card(card)) => {
                    batch.insert(&self.cards, encode(&card.name)?, encode(card)?)
                }
                Change::Put(Entity::Rule(rule)) => {
                    batch.insert(&self.rules, encode(&rule.key())?, encode(rule)?)
                }
                Change::Delete(EntityKey::Bank(name)) => batch.remove(&self.banks, encode(name)?),
                Change::Delete(EntityKey::Card(name)) => batch.remove(&self.cards, encode(name)?),
                Change::Delete(EntityKey::Rule(key)) => batch.remove(&self.rules, encode(key)?),
            }
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(changes = changes.len(), "Disk store COMMIT");
        Ok(())
    }
}
