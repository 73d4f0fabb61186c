//! Human-readable durations for config values such as rate-limit delays
//! (`"13s"`, `"500ms"`) and refresh intervals (`"15m"`).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Units accepted by [`parse_duration`], longest suffix first so `ms` wins over `s`.
const UNITS: &[(&str, u64)] = &[
    ("ms", 1),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
];

/// Parse a duration string like `"500ms"`, `"13s"`, `"15m"`, `"23h"` or `"7d"`.
///
/// The input is case-insensitive and surrounding whitespace is ignored.
///
/// ```
/// use stashboard::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("13s").unwrap(), Duration::from_secs(13));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let Some((number, millis_per_unit)) = UNITS
        .iter()
        .find_map(|(suffix, millis)| s.strip_suffix(suffix).map(|n| (n, *millis)))
    else {
        bail!("Duration must end with ms, s, m, h, or d");
    };

    let number: u64 = number
        .trim()
        .parse()
        .with_context(|| format!("Invalid number in duration {s:?}"))?;
    let millis = number
        .checked_mul(millis_per_unit)
        .context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Format a duration with the largest unit that represents it exactly.
///
/// ```
/// use stashboard::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(13)), "13s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
/// ```
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    for (suffix, unit) in UNITS.iter().skip(1) {
        let unit = u128::from(*unit);
        if millis % unit == 0 {
            return format!("{}{}", millis / unit, suffix);
        }
    }
    format!("{millis}ms")
}

/// Serde deserializer for duration strings.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
