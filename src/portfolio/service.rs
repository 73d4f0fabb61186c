use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::models::{Holding, NewHolding};
use crate::storage::{HoldingsStore, StoreError};

/// Owns the holdings collection for a running session.
///
/// Changes are persisted first and only then published to subscribers, so
/// anything a subscriber sees is already on disk.
pub struct PortfolioService {
    store: Arc<HoldingsStore>,
    holdings_tx: watch::Sender<Vec<Holding>>,
}

impl PortfolioService {
    /// Load the stored holdings and start publishing them.
    pub async fn open(store: Arc<HoldingsStore>) -> Result<Self, StoreError> {
        let holdings = store.load().await?;
        info!(count = holdings.len(), "holdings loaded");
        let (holdings_tx, _) = watch::channel(holdings);
        Ok(Self { store, holdings_tx })
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Holding>> {
        self.holdings_tx.subscribe()
    }

    pub fn holdings(&self) -> Vec<Holding> {
        self.holdings_tx.borrow().clone()
    }

    pub async fn add(&self, holding: NewHolding) -> Result<Vec<Holding>, StoreError> {
        let holdings = self.store.add(holding).await?;
        self.holdings_tx.send_replace(holdings.clone());
        Ok(holdings)
    }

    pub async fn remove(&self, id: &str) -> Result<Vec<Holding>, StoreError> {
        let holdings = self.store.remove(id).await?;
        self.holdings_tx.send_replace(holdings.clone());
        Ok(holdings)
    }

    /// Re-read the store and publish if it changed underneath us (for
    /// example, edited by another process). Returns whether it changed.
    pub async fn reload(&self) -> Result<bool, StoreError> {
        let holdings = self.store.load().await?;
        Ok(self.holdings_tx.send_if_modified(|current| {
            if *current == holdings {
                false
            } else {
                *current = holdings;
                true
            }
        }))
    }
}
