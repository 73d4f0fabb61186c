use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;
use crate::portfolio::PriceStatus;

pub const LOADING_LABEL: &str = "Loading…";
pub const UNAVAILABLE_LABEL: &str = "N/A";
pub const ERROR_LABEL: &str = "Error";

/// How money amounts are rendered for people. Calculations never go through
/// here; values stay `f64` everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub decimals: Option<u32>,
    pub grouping: bool,
    pub symbol: Option<String>,
    pub fixed_decimals: bool,
}

impl CurrencyFormat {
    pub fn from_display(display: &DisplayConfig) -> Self {
        Self {
            decimals: display.currency_decimals,
            grouping: display.currency_grouping,
            symbol: display.currency_symbol.clone(),
            fixed_decimals: display.currency_fixed_decimals,
        }
    }

    /// Render `value`, or `N/A` when it cannot be represented.
    ///
    /// Rounding is half away from zero; trailing zeros are stripped unless
    /// `fixed_decimals` pads to `decimals` places.
    pub fn format(&self, value: f64) -> String {
        let Some(value) = Decimal::from_f64(value) else {
            return UNAVAILABLE_LABEL.to_string();
        };
        let rounded = match self.decimals {
            Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            None => value,
        };

        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let mut digits = rounded.abs().normalize().to_string();
        if self.fixed_decimals {
            if let Some(dp) = self.decimals {
                digits = pad_fraction(&digits, dp);
            }
        }
        if self.grouping {
            digits = group_thousands(&digits);
        }

        let mut out = String::with_capacity(digits.len() + 2);
        if negative {
            out.push('-');
        }
        if let Some(symbol) = &self.symbol {
            out.push_str(symbol);
        }
        out.push_str(&digits);
        out
    }

    /// Render a derived value the way the price panel shows it.
    pub fn format_priced(&self, value: Option<f64>, status: PriceStatus) -> String {
        match (status, value) {
            (PriceStatus::Loading, _) => LOADING_LABEL.to_string(),
            (PriceStatus::Error, _) => ERROR_LABEL.to_string(),
            (_, Some(value)) => self.format(value),
            (_, None) => UNAVAILABLE_LABEL.to_string(),
        }
    }
}

pub fn status_label(status: PriceStatus) -> &'static str {
    match status {
        PriceStatus::Loading => LOADING_LABEL,
        PriceStatus::Priced => "ok",
        PriceStatus::Unavailable => UNAVAILABLE_LABEL,
        PriceStatus::Error => ERROR_LABEL,
    }
}

fn group_thousands(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) if !f.is_empty() => format!("{grouped}.{f}"),
        _ => grouped,
    }
}

fn pad_fraction(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }
    let dp = dp as usize;
    let mut frac: String = frac_part.chars().take(dp).collect();
    while frac.len() < dp {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}
