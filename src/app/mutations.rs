use anyhow::{Context, Result};

use crate::models::NewHolding;
use crate::storage::{HoldingsStore, StoreError};

use super::types::HoldingOutput;

pub async fn list_holdings(store: &HoldingsStore) -> Result<Vec<HoldingOutput>> {
    let holdings = store.load().await.context("Failed to load holdings")?;
    Ok(holdings.iter().map(HoldingOutput::from).collect())
}

pub async fn add_holding(store: &HoldingsStore, holding: NewHolding) -> Result<serde_json::Value> {
    let holdings = store.add(holding).await.context("Failed to add holding")?;
    let added = holdings
        .last()
        .map(HoldingOutput::from)
        .context("Holding missing after add")?;
    Ok(serde_json::json!({
        "success": true,
        "holding": added,
        "count": holdings.len()
    }))
}

pub async fn remove_holding(store: &HoldingsStore, id: &str) -> Result<serde_json::Value> {
    match store.remove(id).await {
        Ok(holdings) => Ok(serde_json::json!({
            "success": true,
            "id": id,
            "count": holdings.len()
        })),
        Err(StoreError::HoldingNotFound(_)) => Ok(serde_json::json!({
            "success": false,
            "error": "Holding not found",
            "id": id
        })),
        Err(e) => Err(e).context("Failed to remove holding"),
    }
}
