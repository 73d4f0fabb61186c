use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::HoldingKind;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid holding id {value:?}: ids must be non-empty and contain no commas, whitespace or URL delimiters"
)]
pub struct HoldingIdError {
    value: String,
}

const RESERVED_CHARS: &[char] = &[',', '/', '\\', '?', '#', '%', '&'];

/// Lookup key of a holding.
///
/// For holdings whose price is fetched from a vendor the id doubles as the
/// vendor symbol (`bitcoin`, `AAPL`, `XAU`). Ids travel inside comma-separated
/// query lists and vendor URLs, so they never contain commas, whitespace or
/// URL delimiters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldingId(String);

impl HoldingId {
    /// Random id for holdings that are never looked up at a vendor.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate a user-supplied id and normalise its case for `kind`.
    pub fn for_kind(kind: HoldingKind, value: &str) -> Result<Self, HoldingIdError> {
        let trimmed = value.trim();
        if !Self::is_valid(trimmed) {
            return Err(HoldingIdError {
                value: value.to_string(),
            });
        }
        Ok(Self(kind.normalize_symbol(trimmed)))
    }

    pub fn is_valid(value: &str) -> bool {
        !value.is_empty()
            && !value.chars().any(|c| {
                c.is_whitespace() || c.is_control() || RESERVED_CHARS.contains(&c)
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HoldingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for HoldingId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for HoldingId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for HoldingId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
