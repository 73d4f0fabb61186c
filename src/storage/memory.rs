//! In-memory backend for tests and embedders without a filesystem.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{validate_key, KeyValueBackend, StoreError};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with one record.
    pub fn with_record(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut records = HashMap::new();
        records.insert(key.into(), value.into());
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.records
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_key() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("holdings").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_replaces_record() {
        let backend = MemoryBackend::with_record("holdings", "[]");
        backend.write("holdings", "[1]").await.unwrap();
        assert_eq!(backend.read("holdings").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.read("../holdings").await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
