//! Core business abstractions

pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod model;
pub mod store;

// Re-export main types for cleaner imports
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CashbackError, StoreError};
pub use model::{Bank, Card, CardCashback, CashbackRule, CategoryRate, Period, RuleKey};
pub use store::{Snapshot, Store};
