use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::duration::deserialize_duration;
use crate::market_data::history::DEFAULT_HISTORY_WINDOW_DAYS;
use crate::market_data::providers::{alpha_vantage, metal_price};

pub const ALPHA_VANTAGE_API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";
pub const METAL_PRICE_API_KEY_ENV: &str = "METAL_PRICE_API_KEY";

const CONFIG_FILE_NAME: &str = "stashboard.toml";

/// Default reporting currency.
fn default_reporting_currency() -> String {
    "USD".to_string()
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// If set, values are rounded to this many decimal places before being
    /// rendered. Calculations are unaffected.
    pub currency_decimals: Option<u32>,

    /// Render values with thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol (e.g. "$", "€") prefixed to rendered values.
    pub currency_symbol: Option<String>,

    /// When true and `currency_decimals` is set, pad to exactly that many
    /// decimal places.
    pub currency_fixed_decimals: bool,
}

fn default_equity_request_delay() -> Duration {
    alpha_vantage::DEFAULT_REQUEST_DELAY
}

fn default_commodity_request_delay() -> Duration {
    metal_price::DEFAULT_REQUEST_DELAY
}

fn default_history_window_days() -> u32 {
    DEFAULT_HISTORY_WINDOW_DAYS
}

/// Vendor endpoints, credentials and pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub coingecko_base_url: Option<String>,
    pub alpha_vantage_base_url: Option<String>,
    pub metal_price_base_url: Option<String>,

    #[serde(deserialize_with = "deserialize_secret_opt")]
    pub alpha_vantage_api_key: Option<SecretString>,

    #[serde(deserialize_with = "deserialize_secret_opt")]
    pub metal_price_api_key: Option<SecretString>,

    /// Gap between two equity quote requests.
    #[serde(
        default = "default_equity_request_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub equity_request_delay: Duration,

    /// Gap between two precious-metal quote requests.
    #[serde(
        default = "default_commodity_request_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub commodity_request_delay: Duration,

    /// Length of the featured holding's price chart.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            coingecko_base_url: None,
            alpha_vantage_base_url: None,
            metal_price_base_url: None,
            alpha_vantage_api_key: None,
            metal_price_api_key: None,
            equity_request_delay: default_equity_request_delay(),
            commodity_request_delay: default_commodity_request_delay(),
            history_window_days: default_history_window_days(),
        }
    }
}

impl MarketDataConfig {
    /// Replace configured API keys with non-empty values from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ALPHA_VANTAGE_API_KEY_ENV) {
            self.alpha_vantage_api_key = Some(SecretString::from(key));
        }
        if let Some(key) = non_empty(METAL_PRICE_API_KEY_ENV) {
            self.metal_price_api_key = Some(SecretString::from(key));
        }
    }
}

fn deserialize_secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

/// Default poll interval for `watch` (60 seconds).
fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

/// Refresh loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// How often `watch` re-reads the holdings record.
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Currency for reporting all values (e.g., "USD")
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub market_data: MarketDataConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            reporting_currency: default_reporting_currency(),
            display: DisplayConfig::default(),
            market_data: MarketDataConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    fn resolve(self, config_dir: &Path) -> ResolvedConfig {
        let data_dir = self.resolve_data_dir(config_dir);
        let mut market_data = self.market_data;
        market_data.apply_env_overrides(|name| std::env::var(name).ok());
        ResolvedConfig {
            data_dir,
            reporting_currency: self.reporting_currency,
            display: self.display,
            market_data,
            refresh: self.refresh,
        }
    }
}

/// Loaded configuration with resolved paths and environment overrides applied.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    /// Currency for reporting all values (e.g., "USD")
    pub reporting_currency: String,

    pub display: DisplayConfig,

    pub market_data: MarketDataConfig,

    pub refresh: RefreshConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./stashboard.toml` if it exists in current directory
/// 2. `stashboard/stashboard.toml` under the XDG data directory
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("stashboard").join(CONFIG_FILE_NAME);
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        Ok(Config::load(&config_path)?.resolve(config_dir))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a file, the config file's intended parent directory is used as
    /// the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Config::default().resolve(config_dir))
    }
}
