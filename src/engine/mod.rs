//! Cashback accrual and card selection engine

pub mod allocation;
pub mod ledger;
pub mod period;
pub mod registry;
pub mod selection;
pub mod unit_of_work;

pub use unit_of_work::UnitOfWork;

use crate::core::clock::Clock;
use crate::core::error::CashbackError;
use crate::core::model::{Card, CardCashback, CategoryRate, Period, RuleKey};
use crate::core::store::Store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Entry point for every cashback operation.
///
/// Each call runs as one unit of work: the month rollover and the operation
/// itself see the same snapshot, and their changes are committed together
/// only if the operation succeeds. Calls are serialised, so two operations
/// never interleave on the same bank or card.
pub struct CashbackService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    gate: Mutex<()>,
}

impl CashbackService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            gate: Mutex::new(()),
        }
    }

    async fn run<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut UnitOfWork, NaiveDate) -> Result<T, CashbackError>,
    ) -> Result<T, CashbackError> {
        let _guard = self.gate.lock().await;
        let today = self.clock.today();
        debug!(operation, %today, "Starting unit of work");

        let mut uow = UnitOfWork::begin(self.store.as_ref()).await?;
        period::rollover(&mut uow, today);
        let value = f(&mut uow, today).inspect_err(|e| {
            warn!(operation, error = %e, "Operation rejected");
        })?;
        uow.commit(self.store.as_ref()).await?;
        Ok(value)
    }

    pub async fn add_bank(&self, name: &str, limit: Option<Decimal>) -> Result<(), CashbackError> {
        self.run("add_bank", |uow, today| {
            registry::add_bank(uow, name, limit, today)
        })
        .await
    }

    pub async fn add_card(&self, bank_name: &str, card_name: &str) -> Result<(), CashbackError> {
        self.run("add_card", |uow, today| {
            registry::add_card(uow, bank_name, card_name, today)
        })
        .await
    }

    pub async fn add_cashback_rule(
        &self,
        period: Period,
        card_name: &str,
        category: &str,
        percent: Decimal,
        permanent: bool,
    ) -> Result<(), CashbackError> {
        let key = RuleKey::new(period, card_name, category);
        self.run("add_cashback_rule", |uow, today| {
            registry::add_cashback_rule(uow, key, percent, permanent, today)
        })
        .await
    }

    pub async fn remove_cashback_rule(
        &self,
        period: Period,
        card_name: &str,
        category: &str,
    ) -> Result<(), CashbackError> {
        let key = RuleKey::new(period, card_name, category);
        self.run("remove_cashback_rule", |uow, _| {
            registry::remove_cashback_rule(uow, &key)
        })
        .await
    }

    pub async fn apply_transaction(
        &self,
        card_name: &str,
        category: &str,
        value: Decimal,
    ) -> Result<(), CashbackError> {
        self.run("apply_transaction", |uow, _| {
            allocation::apply_transaction(uow, card_name, category, value).map(|_| ())
        })
        .await
    }

    /// Current cashback categories of every card.
    pub async fn list_current_rules(
        &self,
    ) -> Result<BTreeMap<String, Vec<CategoryRate>>, CashbackError> {
        self.run("list_current_rules", |uow, _| {
            Ok(registry::list_current_rules_by_card(uow))
        })
        .await
    }

    pub async fn choose_best_card(
        &self,
        category: &str,
        value: Option<Decimal>,
    ) -> Result<Option<String>, CashbackError> {
        self.run("choose_best_card", |uow, _| {
            selection::choose_best_card(uow, category, value)
        })
        .await
    }

    /// Cards that accrued cashback this month, in name order.
    pub async fn estimate_cashback(&self) -> Result<Vec<CardCashback>, CashbackError> {
        self.run("estimate_cashback", |uow, _| {
            Ok(uow
                .find_all::<Card>(|card| card.cashback > Decimal::ZERO)
                .into_iter()
                .map(|card| CardCashback {
                    card: card.name,
                    cashback: card.cashback,
                })
                .collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::error::StoreError;
    use crate::core::store::{Change, Snapshot};
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(today: NaiveDate) -> (CashbackService, Arc<FixedClock>, MemoryStore) {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(today));
        let service = CashbackService::new(Arc::new(store.clone()), clock.clone());
        (service, clock, store)
    }

    #[tokio::test]
    async fn test_failed_operation_persists_nothing() {
        let (service, clock, store) = service(date(2024, 1, 20));
        service.add_bank("Tinkoff", Some(dec!(2000))).await.unwrap();
        service.add_card("Tinkoff", "Black").await.unwrap();
        service
            .apply_transaction("Black", "Food", dec!(100))
            .await
            .unwrap();
        let before = store.load().await.unwrap();

        // A new month would roll the bank over, but the operation fails.
        clock.set(date(2024, 2, 1));
        let result = service.add_card("Alpha", "Only").await;
        assert!(matches!(result, Err(CashbackError::UnknownBank(_))));

        assert_eq!(store.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_reads_commit_rollover() {
        let (service, clock, store) = service(date(2024, 1, 20));
        service.add_bank("Sberbank", None).await.unwrap();
        service.add_card("Sberbank", "MIR").await.unwrap();
        service
            .add_cashback_rule(Period::Current, "MIR", "Food", dec!(5), false)
            .await
            .unwrap();
        service
            .apply_transaction("MIR", "Food", dec!(1300))
            .await
            .unwrap();
        assert_eq!(
            service.estimate_cashback().await.unwrap(),
            vec![CardCashback {
                card: "MIR".to_string(),
                cashback: dec!(65)
            }]
        );

        clock.set(date(2024, 2, 1));
        assert!(service.estimate_cashback().await.unwrap().is_empty());
        assert!(service.list_current_rules().await.unwrap().is_empty());

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.banks["Sberbank"].pay, Decimal::ZERO);
        assert_eq!(snapshot.banks["Sberbank"].period_anchor, date(2024, 2, 1));
        assert!(snapshot.rules.is_empty());
    }

    #[tokio::test]
    async fn test_huge_transactions_are_rejected_not_fatal() {
        let (service, _, store) = service(date(2024, 1, 20));
        service.add_bank("Sberbank", None).await.unwrap();
        service.add_card("Sberbank", "MIR").await.unwrap();
        service
            .add_cashback_rule(Period::Current, "MIR", "Food", dec!(100), false)
            .await
            .unwrap();

        service
            .apply_transaction("MIR", "Food", Decimal::MAX)
            .await
            .unwrap();
        let before = store.load().await.unwrap();

        let result = service.apply_transaction("MIR", "Food", Decimal::MAX).await;
        assert!(matches!(result, Err(CashbackError::InvalidInput(_))));
        assert_eq!(store.load().await.unwrap(), before);
        assert_eq!(
            service.choose_best_card("Food", Some(Decimal::MAX)).await.unwrap(),
            Some("MIR".to_string())
        );
    }

    struct FailingStore {
        inner: MemoryStore,
        fail_commit: AtomicBool,
    }

    #[async_trait]
    impl Store for FailingStore {
        async fn load(&self) -> Result<Snapshot, StoreError> {
            self.inner.load().await
        }

        async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError> {
            if self.fail_commit.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.commit(changes).await
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let inner = MemoryStore::new();
        let store = Arc::new(FailingStore {
            inner: inner.clone(),
            fail_commit: AtomicBool::new(false),
        });
        let service = CashbackService::new(
            store.clone(),
            Arc::new(FixedClock::new(date(2024, 3, 3))),
        );
        service.add_bank("Alpha", None).await.unwrap();

        store.fail_commit.store(true, Ordering::SeqCst);
        let result = service.add_bank("Tinkoff", Some(dec!(2000))).await;

        assert!(matches!(result, Err(CashbackError::Storage(_))));
        let snapshot = inner.load().await.unwrap();
        assert!(snapshot.banks.contains_key("Alpha"));
        assert!(!snapshot.banks.contains_key("Tinkoff"));
    }
}
