use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use stashboard::market_data::providers::AlphaVantagePriceSource;
use stashboard::market_data::{PriceSource, RateLimitConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quote(price: &str) -> String {
    format!(r#"{{"Global Quote": {{"01. symbol": "X", "05. price": "{price}"}}}}"#)
}

fn provider(server: &MockServer, delay: Duration) -> AlphaVantagePriceSource {
    AlphaVantagePriceSource::new("test-key")
        .with_base_url(server.uri())
        .with_rate_limit(&RateLimitConfig::fixed(delay))
}

async fn mount_quote(server: &MockServer, symbol: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "GLOBAL_QUOTE"))
        .and(query_param("symbol", symbol))
        .and(query_param("apikey", "test-key"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn alpha_vantage_spaces_sequential_requests() -> Result<()> {
    let server = MockServer::start().await;
    for (symbol, price) in [("AAPL", "189.50"), ("MSFT", "410.00"), ("NVDA", "900.10")] {
        mount_quote(
            &server,
            symbol,
            ResponseTemplate::new(200).set_body_raw(quote(price), "application/json"),
        )
        .await;
    }

    let delay = Duration::from_millis(150);
    let symbols: BTreeSet<String> = ["AAPL", "MSFT", "NVDA"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let started = Instant::now();
    let prices = provider(&server, delay).fetch_prices(&symbols).await?;
    let elapsed = started.elapsed();

    assert_eq!(prices.len(), 3);
    assert_eq!(prices["MSFT"].price, 410.0);
    assert!(
        elapsed >= delay * 2,
        "three requests took {elapsed:?}, expected at least {:?}",
        delay * 2
    );
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);
    Ok(())
}

#[tokio::test]
async fn alpha_vantage_per_symbol_failures_do_not_abort_batch() -> Result<()> {
    let server = MockServer::start().await;
    mount_quote(
        &server,
        "AAPL",
        ResponseTemplate::new(200).set_body_raw(quote("189.50"), "application/json"),
    )
    .await;
    mount_quote(
        &server,
        "BAD",
        ResponseTemplate::new(200)
            .set_body_raw(r#"{"Error Message": "Invalid API call."}"#, "application/json"),
    )
    .await;
    mount_quote(
        &server,
        "BUSY",
        ResponseTemplate::new(200).set_body_raw(
            r#"{"Note": "Our standard API call frequency is 5 calls per minute."}"#,
            "application/json",
        ),
    )
    .await;
    mount_quote(&server, "DOWN", ResponseTemplate::new(500)).await;
    mount_quote(
        &server,
        "JUNK",
        ResponseTemplate::new(200).set_body_raw(quote("n/a"), "application/json"),
    )
    .await;

    let symbols: BTreeSet<String> = ["AAPL", "BAD", "BUSY", "DOWN", "JUNK"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let prices = provider(&server, Duration::ZERO)
        .fetch_prices(&symbols)
        .await?;

    assert_eq!(prices.len(), 1);
    assert_eq!(prices["AAPL"].price, 189.5);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 5);
    Ok(())
}

#[tokio::test]
async fn alpha_vantage_empty_input_makes_no_request() -> Result<()> {
    let server = MockServer::start().await;
    let prices = provider(&server, Duration::from_secs(13))
        .fetch_prices(&BTreeSet::new())
        .await?;
    assert!(prices.is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}
