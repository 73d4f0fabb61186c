use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{HoldingId, HoldingIdError};

/// Category of a holding. Decides which price source (if any) values it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingKind {
    Crypto,
    #[serde(alias = "stock")]
    Equity,
    #[serde(alias = "metal")]
    Commodity,
    #[serde(alias = "realEstate")]
    RealEstate,
    Other,
}

impl HoldingKind {
    /// True for kinds whose unit price comes from a market data vendor.
    pub fn is_fetchable(self) -> bool {
        matches!(
            self,
            HoldingKind::Crypto | HoldingKind::Equity | HoldingKind::Commodity
        )
    }

    /// Vendor symbol casing: lowercase coin ids, uppercase tickers and metal codes.
    pub fn normalize_symbol(self, symbol: &str) -> String {
        match self {
            HoldingKind::Crypto => symbol.trim().to_lowercase(),
            HoldingKind::Equity | HoldingKind::Commodity => symbol.trim().to_uppercase(),
            HoldingKind::RealEstate | HoldingKind::Other => symbol.trim().to_string(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HoldingKind::Crypto => "crypto",
            HoldingKind::Equity => "equity",
            HoldingKind::Commodity => "commodity",
            HoldingKind::RealEstate => "real_estate",
            HoldingKind::Other => "other",
        }
    }

    /// Unit label used when rendering quantities.
    pub fn unit_label(self) -> &'static str {
        match self {
            HoldingKind::Crypto => "coins",
            HoldingKind::Equity => "shares",
            HoldingKind::Commodity => "oz",
            HoldingKind::RealEstate | HoldingKind::Other => "units",
        }
    }
}

impl fmt::Display for HoldingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HoldingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "crypto" => Ok(HoldingKind::Crypto),
            "equity" | "stock" => Ok(HoldingKind::Equity),
            "commodity" | "metal" => Ok(HoldingKind::Commodity),
            "real_estate" | "realestate" => Ok(HoldingKind::RealEstate),
            "other" => Ok(HoldingKind::Other),
            other => Err(format!(
                "unknown holding kind {other:?} (expected crypto, equity, commodity, real_estate or other)"
            )),
        }
    }
}

/// One entry of the user's portfolio, as persisted on disk.
///
/// Derived values (unit price, total value) are never part of this record;
/// see [`crate::portfolio::CalculatedHolding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: HoldingId,
    pub kind: HoldingKind,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub ticker_label: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_amount"
    )]
    pub purchase_value: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_amount"
    )]
    pub manual_value: Option<f64>,
}

impl Holding {
    /// Key under which this holding's unit price appears in a price map.
    pub fn price_key(&self) -> String {
        self.kind.normalize_symbol(self.id.as_str())
    }

    /// Check amounts read back from storage, which skip `NewHolding` validation.
    pub fn validate_amounts(&self) -> Result<(), HoldingError> {
        check_amount("quantity", self.quantity)?;
        if let Some(value) = self.purchase_value {
            check_amount("purchase value", value)?;
        }
        if let Some(value) = self.manual_value {
            check_amount("manual value", value)?;
        }
        Ok(())
    }

    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            self.id.as_str()
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HoldingError {
    #[error(transparent)]
    InvalidId(#[from] HoldingIdError),
    #[error("{0} holdings need a vendor symbol as their id")]
    MissingSymbol(HoldingKind),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// A holding as submitted by the user, before it gets an id and is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHolding {
    pub kind: HoldingKind,
    pub id: Option<String>,
    pub display_name: String,
    pub ticker_label: Option<String>,
    pub quantity: f64,
    pub purchase_value: Option<f64>,
    pub manual_value: Option<f64>,
}

impl NewHolding {
    pub fn new(kind: HoldingKind, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            id: None,
            display_name: display_name.into(),
            ticker_label: None,
            quantity: 0.0,
            purchase_value: None,
            manual_value: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_ticker_label(mut self, label: impl Into<String>) -> Self {
        self.ticker_label = Some(label.into());
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_purchase_value(mut self, value: f64) -> Self {
        self.purchase_value = Some(value);
        self
    }

    pub fn with_manual_value(mut self, value: f64) -> Self {
        self.manual_value = Some(value);
        self
    }

    /// Validate the submission and assign its id.
    ///
    /// Fetchable kinds must name their vendor symbol; other kinds get a
    /// generated id when none is given.
    pub fn into_holding(self) -> Result<Holding, HoldingError> {
        check_amount("quantity", self.quantity)?;
        if let Some(value) = self.purchase_value {
            check_amount("purchase value", value)?;
        }
        if let Some(value) = self.manual_value {
            check_amount("manual value", value)?;
        }

        let supplied = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        let id = match supplied {
            Some(value) => HoldingId::for_kind(self.kind, value)?,
            None if self.kind.is_fetchable() => return Err(HoldingError::MissingSymbol(self.kind)),
            None => HoldingId::generate(),
        };

        let ticker_label = match self.ticker_label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ if self.kind.is_fetchable() => id.as_str().to_uppercase(),
            _ => String::new(),
        };

        Ok(Holding {
            id,
            kind: self.kind,
            display_name: self.display_name.trim().to_string(),
            ticker_label,
            quantity: self.quantity,
            purchase_value: self.purchase_value,
            manual_value: self.manual_value,
        })
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), HoldingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(HoldingError::InvalidAmount { field, value })
    }
}

/// Numbers written by form inputs may have been stored as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredNumber {
    Number(f64),
    Text(String),
}

impl StoredNumber {
    fn value(self) -> Option<f64> {
        let value = match self {
            StoredNumber::Number(n) => n,
            StoredNumber::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let stored: Option<StoredNumber> = Option::deserialize(deserializer)?;
    Ok(stored.and_then(StoredNumber::value).unwrap_or(0.0))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored: Option<StoredNumber> = Option::deserialize(deserializer)?;
    Ok(stored.and_then(StoredNumber::value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetchable_kind_requires_symbol() {
        let err = NewHolding::new(HoldingKind::Equity, "Apple")
            .with_quantity(3.0)
            .into_holding()
            .unwrap_err();
        assert_eq!(err, HoldingError::MissingSymbol(HoldingKind::Equity));
    }

    #[test]
    fn test_manual_kind_gets_generated_id() {
        let holding = NewHolding::new(HoldingKind::RealEstate, "Flat")
            .with_quantity(1.0)
            .with_manual_value(250_000.0)
            .into_holding()
            .unwrap();
        assert!(!holding.id.as_str().is_empty());
        assert_eq!(holding.ticker_label, "");
    }

    #[test]
    fn test_ticker_label_defaults_to_symbol() {
        let holding = NewHolding::new(HoldingKind::Crypto, "Bitcoin")
            .with_id("Bitcoin")
            .with_quantity(2.0)
            .into_holding()
            .unwrap();
        assert_eq!(holding.id, "bitcoin");
        assert_eq!(holding.ticker_label, "BITCOIN");
    }

    #[test]
    fn test_rejects_negative_and_nan_amounts() {
        let negative = NewHolding::new(HoldingKind::Other, "Watch")
            .with_quantity(-1.0)
            .into_holding();
        assert!(matches!(
            negative,
            Err(HoldingError::InvalidAmount { field: "quantity", .. })
        ));

        let nan = NewHolding::new(HoldingKind::Other, "Watch")
            .with_purchase_value(f64::NAN)
            .into_holding();
        assert!(matches!(
            nan,
            Err(HoldingError::InvalidAmount { field: "purchase value", .. })
        ));
    }

    #[test]
    fn test_stored_negative_amounts_fail_validation() {
        let holding: Holding = serde_json::from_str(
            r#"{"id": "misc", "kind": "other", "quantity": "2", "purchaseValue": -10}"#,
        )
        .unwrap();
        assert_eq!(holding.purchase_value, Some(-10.0));
        assert!(matches!(
            holding.validate_amounts(),
            Err(HoldingError::InvalidAmount { field: "purchase value", .. })
        ));

        let holding: Holding =
            serde_json::from_str(r#"{"id": "bitcoin", "kind": "crypto", "quantity": 0.5}"#)
                .unwrap();
        assert!(holding.validate_amounts().is_ok());
    }

    #[test]
    fn test_serialization_uses_camel_case_and_skips_missing_amounts() {
        let holding = NewHolding::new(HoldingKind::Equity, "Apple")
            .with_id("aapl")
            .with_quantity(3.0)
            .into_holding()
            .unwrap();
        let json = serde_json::to_string(&holding).unwrap();
        assert_eq!(
            json,
            r#"{"id":"AAPL","kind":"equity","displayName":"Apple","tickerLabel":"AAPL","quantity":3.0}"#
        );
    }

    #[test]
    fn test_deserialize_tolerates_strings_nulls_and_derived_fields() {
        let json = r#"{
            "id": "house-1",
            "kind": "realEstate",
            "displayName": "House",
            "quantity": null,
            "purchaseValue": "180000.50",
            "manualValue": 320000,
            "unitPrice": 1,
            "totalValue": 320000
        }"#;
        let holding: Holding = serde_json::from_str(json).unwrap();
        assert_eq!(holding.kind, HoldingKind::RealEstate);
        assert_eq!(holding.quantity, 0.0);
        assert_eq!(holding.purchase_value, Some(180000.5));
        assert_eq!(holding.manual_value, Some(320000.0));

        let written = serde_json::to_string(&holding).unwrap();
        assert!(!written.contains("unitPrice"));
        assert!(!written.contains("totalValue"));
    }

    #[test]
    fn test_kind_parses_aliases() {
        assert_eq!("stock".parse::<HoldingKind>(), Ok(HoldingKind::Equity));
        assert_eq!("real-estate".parse::<HoldingKind>(), Ok(HoldingKind::RealEstate));
        assert!("bond".parse::<HoldingKind>().is_err());
    }
}
