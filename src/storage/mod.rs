//! Durable key-value records and the holdings collection stored in them.

mod holdings;
mod json_file;
mod memory;

pub use holdings::{HoldingsStore, HOLDINGS_KEY};
pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;

use thiserror::Error;

use crate::models::{HoldingError, HoldingId};

#[derive(Error, Debug)]
pub enum StoreError {
    /// The stored holdings record is not a valid holdings array.
    #[error("stored holdings under {key:?} are malformed: {source}")]
    PersistenceParse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("a holding with id {0} already exists")]
    DuplicateHolding(HoldingId),

    #[error("no holding with id {0}")]
    HoldingNotFound(String),

    #[error(transparent)]
    InvalidHolding(#[from] HoldingError),

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("storage backend failed for {key:?}: {source}")]
    Backend {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize holdings: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A place to keep whole records by key.
///
/// Writes replace the record atomically: a reader sees either the previous
/// value or the new one, never a partial write.
#[async_trait::async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Keys become file names, so keep them to a safe alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
