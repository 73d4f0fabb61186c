use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::{validate_key, KeyValueBackend, StoreError};

/// Keeps each record in its own JSON file.
///
/// Directory structure:
/// ```text
/// data/
///   holdings.json
/// ```
pub struct JsonFileBackend {
    base_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{key}.json"))
    }
}

fn backend_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Backend {
        key: key.to_string(),
        source,
    }
}

#[async_trait::async_trait]
impl KeyValueBackend for JsonFileBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match fs::read_to_string(self.record_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend_error(key)(e)),
        }
    }

    /// Write to a sibling temp file, then rename it over the record.
    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(backend_error(key))?;

        let path = self.record_path(key);
        let tmp_path = self.base_path.join(format!(".{key}.json.tmp"));
        fs::write(&tmp_path, value)
            .await
            .map_err(backend_error(key))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(backend_error(key))?;

        debug!(path = %path.display(), bytes = value.len(), "record written");
        Ok(())
    }
}
