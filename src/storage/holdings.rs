use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{KeyValueBackend, StoreError};
use crate::models::{Holding, HoldingId, NewHolding};

/// Record key of the holdings collection.
pub const HOLDINGS_KEY: &str = "holdings";

/// The user's holdings, persisted as one JSON array.
///
/// Every mutation reads the current collection, builds a new one and writes
/// it back whole. Mutations are serialized through a lock so two concurrent
/// adds cannot lose each other's write.
pub struct HoldingsStore {
    backend: Arc<dyn KeyValueBackend>,
    write_lock: Mutex<()>,
}

impl HoldingsStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the collection.
    ///
    /// A missing record is an empty portfolio. A record that does not parse
    /// is logged and also treated as empty; it is left on disk until the
    /// next save replaces it.
    pub async fn load(&self) -> Result<Vec<Holding>, StoreError> {
        let Some(content) = self.backend.read(HOLDINGS_KEY).await? else {
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let parsed: Vec<Holding> = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(source) => {
                let err = StoreError::PersistenceParse {
                    key: HOLDINGS_KEY.to_string(),
                    source,
                };
                warn!(error = %err, "discarding unreadable holdings; starting empty");
                return Ok(Vec::new());
            }
        };

        let mut seen = HashSet::new();
        let mut holdings = Vec::with_capacity(parsed.len());
        for holding in parsed {
            if !HoldingId::is_valid(holding.id.as_str()) {
                warn!(id = %holding.id, "skipping stored holding with invalid id");
                continue;
            }
            if let Err(err) = holding.validate_amounts() {
                warn!(id = %holding.id, error = %err, "skipping stored holding with invalid amount");
                continue;
            }
            if !seen.insert(holding.id.clone()) {
                warn!(id = %holding.id, "skipping duplicate stored holding");
                continue;
            }
            holdings.push(holding);
        }
        Ok(holdings)
    }

    /// Replace the stored collection.
    pub async fn save(&self, holdings: &[Holding]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(holdings).await
    }

    /// Validate and append a holding; returns the new collection.
    pub async fn add(&self, new_holding: NewHolding) -> Result<Vec<Holding>, StoreError> {
        let holding = new_holding.into_holding()?;

        let _guard = self.write_lock.lock().await;
        let mut holdings = self.load().await?;
        if holdings.iter().any(|h| h.id == holding.id) {
            return Err(StoreError::DuplicateHolding(holding.id));
        }

        info!(id = %holding.id, kind = %holding.kind, "adding holding");
        holdings.push(holding);
        self.write(&holdings).await?;
        Ok(holdings)
    }

    /// Remove the holding with `id`; returns the new collection.
    ///
    /// An exact match wins; otherwise `id` is normalised the way `add`
    /// normalises each holding's kind, so `aapl` removes `AAPL`.
    pub async fn remove(&self, id: &str) -> Result<Vec<Holding>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut holdings = self.load().await?;

        let wanted = id.trim();
        let position = holdings.iter().position(|h| h.id == wanted).or_else(|| {
            holdings
                .iter()
                .position(|h| h.id == h.kind.normalize_symbol(wanted).as_str())
        });
        let Some(position) = position else {
            return Err(StoreError::HoldingNotFound(id.to_string()));
        };

        let removed = holdings.remove(position);
        info!(id = %removed.id, "removing holding");
        self.write(&holdings).await?;
        Ok(holdings)
    }

    async fn write(&self, holdings: &[Holding]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(holdings).map_err(StoreError::Serialize)?;
        self.backend.write(HOLDINGS_KEY, &content).await
    }
}
