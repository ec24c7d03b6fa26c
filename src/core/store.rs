//! Storage abstractions consumed by the engine

use crate::core::error::StoreError;
use crate::core::model::{Bank, Card, CashbackRule, RuleKey};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Every record held by a store, indexed by its natural key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub banks: BTreeMap<String, Bank>,
    pub cards: BTreeMap<String, Card>,
    pub rules: BTreeMap<RuleKey, CashbackRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityKey {
    Bank(String),
    Card(String),
    Rule(RuleKey),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Bank(Bank),
    Card(Card),
    Rule(CashbackRule),
}

/// Final state of one record after a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Put(Entity),
    Delete(EntityKey),
}

impl Snapshot {
    pub fn apply(&mut self, change: Change) {
        match change {
            Change::Put(Entity::Bank(bank)) => {
                self.banks.insert(bank.name.clone(), bank);
            }
            Change::Put(Entity::Card(card)) => {
                self.cards.insert(card.name.clone(), card);
            }
            Change::Put(Entity::Rule(rule)) => {
                self.rules.insert(rule.key(), rule);
            }
            Change::Delete(EntityKey::Bank(name)) => {
                self.banks.remove(&name);
            }
            Change::Delete(EntityKey::Card(name)) => {
                self.cards.remove(&name);
            }
            Change::Delete(EntityKey::Rule(key)) => {
                self.rules.remove(&key);
            }
        }
    }
}

/// A record kind the unit of work can create, find, update and delete.
pub trait Record: Clone {
    type Key: Ord + Clone + Display;

    const KIND: &'static str;

    fn key(&self) -> Self::Key;
    fn table(snapshot: &Snapshot) -> &BTreeMap<Self::Key, Self>;
    fn table_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<Self::Key, Self>;
    fn entity_key(key: &Self::Key) -> EntityKey;
    fn into_entity(self) -> Entity;
}

impl Record for Bank {
    type Key = String;

    const KIND: &'static str = "bank";

    fn key(&self) -> String {
        self.name.clone()
    }

    fn table(snapshot: &Snapshot) -> &BTreeMap<String, Self> {
        &snapshot.banks
    }

    fn table_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<String, Self> {
        &mut snapshot.banks
    }

    fn entity_key(key: &String) -> EntityKey {
        EntityKey::Bank(key.clone())
    }

    fn into_entity(self) -> Entity {
        Entity::Bank(self)
    }
}

impl Record for Card {
    type Key = String;

    const KIND: &'static str = "card";

    fn key(&self) -> String {
        self.name.clone()
    }

    fn table(snapshot: &Snapshot) -> &BTreeMap<String, Self> {
        &snapshot.cards
    }

    fn table_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<String, Self> {
        &mut snapshot.cards
    }

    fn entity_key(key: &String) -> EntityKey {
        EntityKey::Card(key.clone())
    }

    fn into_entity(self) -> Entity {
        Entity::Card(self)
    }
}

impl Record for CashbackRule {
    type Key = RuleKey;

    const KIND: &'static str = "cashback";

    fn key(&self) -> RuleKey {
        CashbackRule::key(self)
    }

    fn table(snapshot: &Snapshot) -> &BTreeMap<RuleKey, Self> {
        &snapshot.rules
    }

    fn table_mut(snapshot: &mut Snapshot) -> &mut BTreeMap<RuleKey, Self> {
        &mut snapshot.rules
    }

    fn entity_key(key: &RuleKey) -> EntityKey {
        EntityKey::Rule(key.clone())
    }

    fn into_entity(self) -> Entity {
        Entity::Rule(self)
    }
}

/// Persistence backend. `commit` must apply all changes or none.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self) -> Result<Snapshot, StoreError>;
    async fn commit(&self, changes: Vec<Change>) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_apply_put_and_delete() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mut snapshot = Snapshot::default();

        snapshot.apply(Change::Put(Entity::Bank(Bank::new("Alpha", None, today))));
        snapshot.apply(Change::Put(Entity::Card(Card::new("Only", "Alpha", today))));
        let rule = CashbackRule {
            period: Period::Current,
            card: "Only".to_string(),
            category: "Pharmacies".to_string(),
            percent: dec!(3),
            permanent: false,
            period_anchor: today,
        };
        snapshot.apply(Change::Put(Entity::Rule(rule.clone())));

        assert_eq!(snapshot.banks.len(), 1);
        assert_eq!(snapshot.cards["Only"].bank, "Alpha");
        assert_eq!(snapshot.rules.get(&rule.key()), Some(&rule));

        snapshot.apply(Change::Delete(EntityKey::Rule(rule.key())));
        assert!(snapshot.rules.is_empty());
    }
}
