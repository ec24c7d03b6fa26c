use crate::core::error::{CashbackError, StoreError};
use crate::core::store::{Change, EntityKey, Record, Snapshot, Store};
use std::collections::BTreeMap;
use tracing::debug;

/// Working copy of the store for a single operation.
///
/// Reads and writes go to an in-memory snapshot. Every touched record is
/// tracked, and `commit` hands their final state to the store in one call.
/// Dropping the unit of work without committing discards all changes.
pub struct UnitOfWork {
    snapshot: Snapshot,
    touched: BTreeMap<EntityKey, Change>,
}

impl UnitOfWork {
    pub async fn begin(store: &dyn Store) -> Result<Self, StoreError> {
        Ok(Self::from_snapshot(store.load().await?))
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            touched: BTreeMap::new(),
        }
    }

    /// Inserts a new record, failing if one with the same key exists.
    pub fn create<R: Record>(&mut self, record: R) -> Result<(), CashbackError> {
        let key = record.key();
        if R::table(&self.snapshot).contains_key(&key) {
            return Err(CashbackError::duplicate(R::KIND, key.to_string()));
        }
        self.put(record);
        Ok(())
    }

    /// Inserts or replaces a record.
    pub fn put<R: Record>(&mut self, record: R) {
        let key = record.key();
        self.touched
            .insert(R::entity_key(&key), Change::Put(record.clone().into_entity()));
        R::table_mut(&mut self.snapshot).insert(key, record);
    }

    pub fn find<R: Record>(&self, key: &R::Key) -> Option<&R> {
        R::table(&self.snapshot).get(key)
    }

    /// Records matching `predicate`, in key order.
    pub fn find_all<R: Record>(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        R::table(&self.snapshot)
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Applies `mutator` to the record stored under `key`. Returns false if absent.
    pub fn update<R: Record>(&mut self, key: &R::Key, mutator: impl FnOnce(&mut R)) -> bool {
        let Some(record) = R::table_mut(&mut self.snapshot).get_mut(key) else {
            return false;
        };
        mutator(record);
        let change = Change::Put(record.clone().into_entity());
        self.touched.insert(R::entity_key(key), change);
        true
    }

    pub fn delete<R: Record>(&mut self, key: &R::Key) -> Option<R> {
        let removed = R::table_mut(&mut self.snapshot).remove(key)?;
        self.touched
            .insert(R::entity_key(key), Change::Delete(R::entity_key(key)));
        Some(removed)
    }

    pub fn has_changes(&self) -> bool {
        !self.touched.is_empty()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.touched.into_values().collect()
    }

    pub async fn commit(self, store: &dyn Store) -> Result<(), StoreError> {
        if !self.has_changes() {
            return Ok(());
        }
        let changes = self.into_changes();
        debug!(changes = changes.len(), "Committing unit of work");
        store.commit(changes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Bank, Card};
    use crate::core::store::Entity;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    #[test]
    fn test_create_rejects_duplicate_key() {
        let mut uow = UnitOfWork::from_snapshot(Snapshot::default());
        uow.create(Bank::new("Sberbank", None, today())).unwrap();

        let result = uow.create(Bank::new("Sberbank", Some(dec!(10)), today()));
        assert!(matches!(
            result,
            Err(CashbackError::DuplicateEntity { kind: "bank", .. })
        ));
        assert_eq!(uow.find::<Bank>(&"Sberbank".to_string()).unwrap().limit, None);
    }

    #[test]
    fn test_repeated_updates_collapse_into_one_change() {
        let mut uow = UnitOfWork::from_snapshot(Snapshot::default());
        uow.create(Card::new("MIR", "Sberbank", today())).unwrap();
        let key = "MIR".to_string();
        assert!(uow.update::<Card>(&key, |card| card.cashback += dec!(10)));
        assert!(uow.update::<Card>(&key, |card| card.cashback += dec!(5)));
        assert!(!uow.update::<Card>(&"Missing".to_string(), |_| {}));

        let changes = uow.into_changes();
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            Change::Put(Entity::Card(card)) => assert_eq!(card.cashback, dec!(15)),
            other => panic!("Unexpected change: {other:?}"),
        }
    }

    #[test]
    fn test_delete_after_create_emits_delete() {
        let mut uow = UnitOfWork::from_snapshot(Snapshot::default());
        uow.create(Bank::new("Alpha", None, today())).unwrap();
        assert!(uow.delete::<Bank>(&"Alpha".to_string()).is_some());
        assert!(uow.delete::<Bank>(&"Alpha".to_string()).is_none());

        assert_eq!(
            uow.into_changes(),
            vec![Change::Delete(EntityKey::Bank("Alpha".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_leaves_store_untouched() {
        let store = MemoryStore::new();
        {
            let mut uow = UnitOfWork::begin(&store).await.unwrap();
            uow.create(Bank::new("Alpha", None, today())).unwrap();
        }
        assert!(store.load().await.unwrap().banks.is_empty());

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        uow.create(Bank::new("Alpha", None, today())).unwrap();
        uow.commit(&store).await.unwrap();
        assert_eq!(store.load().await.unwrap().banks.len(), 1);
    }
}
