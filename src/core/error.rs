//! Error types returned by the cashback engine and its stores

use thiserror::Error;

/// Failure of the storage backend. Aborts the enclosing unit of work.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("Failed to encode or decode a record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CashbackError {
    #[error("The {kind} {name} already exists")]
    DuplicateEntity { kind: &'static str, name: String },

    #[error("Unknown bank: {0}")]
    UnknownBank(String),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("No such cashback: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl CashbackError {
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        CashbackError::DuplicateEntity {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CashbackError::InvalidInput(message.into())
    }
}
