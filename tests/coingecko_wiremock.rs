use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use stashboard::clock::FixedClock;
use stashboard::market_data::providers::CoinGeckoPriceSource;
use stashboard::market_data::{FetchError, HistorySource, PriceSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn coingecko_batches_ids_in_one_request() -> Result<()> {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "bitcoin,ethereum,notacoin"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"bitcoin": {"usd": 50000}, "ethereum": {"usd": "oops"}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let prices = provider
        .fetch_prices(&ids(&["bitcoin", "ethereum", "notacoin"]))
        .await?;

    assert_eq!(prices.len(), 1);
    assert_eq!(prices["bitcoin"].price, 50000.0);
    Ok(())
}

#[tokio::test]
async fn coingecko_empty_input_makes_no_request() -> Result<()> {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(server.uri());

    let prices = provider.fetch_prices(&BTreeSet::new()).await?;
    assert!(prices.is_empty());

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "expected no HTTP requests");
    Ok(())
}

#[tokio::test]
async fn coingecko_non_2xx_is_batch_error() {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let err = provider.fetch_prices(&ids(&["bitcoin"])).await.unwrap_err();
    assert!(matches!(err, FetchError::Batch { .. }), "got {err:?}");
}

#[tokio::test]
async fn coingecko_rate_limit_payload_is_batch_error() {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": {"error_code": 429, "error_message": "You've exceeded the Rate Limit."}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = provider.fetch_prices(&ids(&["bitcoin"])).await.unwrap_err();
    assert!(err.to_string().contains("Rate Limit"));
}

#[tokio::test]
async fn coingecko_history_drops_partial_day() -> Result<()> {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 0).unwrap();
    let provider = CoinGeckoPriceSource::new()
        .with_base_url(server.uri())
        .with_clock(Arc::new(FixedClock::new(now)));

    let day_two = (now - Duration::days(2)).timestamp_millis();
    let day_one = (now - Duration::days(1)).timestamp_millis();
    let two_hours_ago = (now - Duration::hours(2)).timestamp_millis();
    let body = format!(
        r#"{{"prices": [[{day_one}, 62000.0], [{day_two}, 61000.0], [{two_hours_ago}, 62500.0]]}}"#
    );

    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("days", "30"))
        .and(query_param("interval", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let points = provider
        .fetch_history("bitcoin", 30)
        .await
        .expect("expected history");

    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![61000.0, 62000.0]);
    Ok(())
}

#[tokio::test]
async fn coingecko_history_failure_is_none() {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"coin not found"}"#))
        .mount(&server)
        .await;

    assert!(provider.fetch_history("bitcoin", 30).await.is_none());
}

#[tokio::test]
async fn coingecko_history_escapes_id_into_one_path_segment() -> Result<()> {
    let server = MockServer::start().await;
    let provider = CoinGeckoPriceSource::new().with_base_url(format!("{}/api/v3", server.uri()));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"prices": []}"#, "application/json"))
        .mount(&server)
        .await;

    provider.fetch_history("../../admin?x=1#", 30).await;

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let url = &requests[0].url;
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    assert_eq!(segments.len(), 5, "unexpected path {}", url.path());
    assert_eq!(&segments[..3], &["api", "v3", "coins"]);
    assert_eq!(segments[4], "market_chart");
    assert!(!segments[3].contains('/') && !segments[3].contains('?'));
    assert!(url.fragment().is_none());

    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(params.iter().all(|(key, _)| key != "x"));
    assert!(params.contains(&("days".to_string(), "30".to_string())));
    Ok(())
}
