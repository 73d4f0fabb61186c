use std::collections::BTreeSet;

use serde::Serialize;

use tracing::warn;

use crate::models::{Holding, HoldingId, HoldingKind};

/// The ids one aggregator run needs, split by the source that prices them.
///
/// Two requests compare equal exactly when a run for one would fetch the same
/// things as a run for the other, which is what the refresh controller uses to
/// skip redundant runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshRequest {
    pub crypto: BTreeSet<String>,
    pub equity: BTreeSet<String>,
    pub commodity: BTreeSet<String>,
    /// Holding charted in the history view: the first crypto holding.
    pub featured: Option<String>,
}

impl RefreshRequest {
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let mut request = Self::default();
        for holding in holdings {
            let key = holding.price_key();
            match holding.kind {
                HoldingKind::Crypto => {
                    if request.featured.is_none() {
                        request.featured = Some(key.clone());
                    }
                    request.crypto.insert(key);
                }
                HoldingKind::Equity => {
                    request.equity.insert(key);
                }
                HoldingKind::Commodity => {
                    request.commodity.insert(key);
                }
                HoldingKind::RealEstate | HoldingKind::Other => {}
            }
        }
        request
    }

    /// Build a request from comma-separated id lists.
    ///
    /// Blank entries are skipped. The featured id is the first crypto id as
    /// listed, before deduplication reorders them.
    pub fn from_query(crypto: Option<&str>, equity: Option<&str>, commodity: Option<&str>) -> Self {
        let crypto_ids = split_ids(crypto, HoldingKind::Crypto);
        Self {
            featured: crypto_ids.first().cloned(),
            crypto: crypto_ids.into_iter().collect(),
            equity: split_ids(equity, HoldingKind::Equity).into_iter().collect(),
            commodity: split_ids(commodity, HoldingKind::Commodity)
                .into_iter()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.crypto.is_empty() && self.equity.is_empty() && self.commodity.is_empty()
    }

    pub fn id_count(&self) -> usize {
        self.crypto.len() + self.equity.len() + self.commodity.len()
    }
}

fn split_ids(list: Option<&str>, kind: HoldingKind) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(|id| kind.normalize_symbol(id))
        .filter(|id| !id.is_empty())
        .filter(|id| {
            let valid = HoldingId::is_valid(id);
            if !valid {
                warn!(id = %id, %kind, "dropping invalid id from query");
            }
            valid
        })
        .collect()
}
