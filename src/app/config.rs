use std::path::Path;

use crate::config::ResolvedConfig;
use crate::duration::format_duration;

pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    let market = &config.market_data;
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "data_directory": config.data_dir.display().to_string(),
        "reporting_currency": config.reporting_currency,
        "market_data": {
            "alpha_vantage_configured": market.alpha_vantage_api_key.is_some(),
            "metal_price_configured": market.metal_price_api_key.is_some(),
            "equity_request_delay": format_duration(market.equity_request_delay),
            "commodity_request_delay": format_duration(market.commodity_request_delay),
            "history_window_days": market.history_window_days
        },
        "refresh": {
            "poll_interval": format_duration(config.refresh.poll_interval)
        }
    })
}
