//! Binance-futures-style REST market data client.
//!
//! Implements the engine's candle, order-book and 24h-volume providers
//! against `/fapi/v1/klines`, `/fapi/v1/depth` and `/fapi/v1/ticker/24hr`.

use crate::config::MarketDataConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use srzone_core::{BookLevel, Candle, OrderBook, Period};
use srzone_engine::{
    CandleProvider, OrderBookProvider, ProviderError, ProviderResult, VolumeProvider,
};
use tracing::debug;

/// Depth limits accepted by the depth endpoint.
const DEPTH_LIMITS: [usize; 7] = [5, 10, 20, 50, 100, 500, 1000];

/// Upper bound on klines per request.
const MAX_KLINES: usize = 1500;

#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

/// REST client for one exchange base URL.
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(config: &MarketDataConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.rest_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("GET {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl CandleProvider for BinanceClient {
    async fn get_history(
        &self,
        symbol: &str,
        period: &Period,
        limit: usize,
    ) -> ProviderResult<Vec<Candle>> {
        // One extra row covers the still-open candle that gets dropped.
        let request_limit = (limit + 1).min(MAX_KLINES);
        let rows: Vec<Vec<Value>> = self
            .get_json(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", period.as_str().to_string()),
                    ("limit", request_limit.to_string()),
                ],
            )
            .await?;

        let mut candles = parse_klines(&rows, Utc::now())?;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        debug!(symbol = %symbol, period = %period, candles = candles.len(), "Klines fetched");
        Ok(candles)
    }
}

#[async_trait]
impl OrderBookProvider for BinanceClient {
    async fn get_order_book(&self, symbol: &str, depth: usize) -> ProviderResult<OrderBook> {
        let response: DepthResponse = self
            .get_json(
                "/fapi/v1/depth",
                &[
                    ("symbol", symbol.to_string()),
                    ("limit", depth_limit(depth).to_string()),
                ],
            )
            .await?;
        parse_depth(symbol, response, depth)
    }
}

#[async_trait]
impl VolumeProvider for BinanceClient {
    async fn volume_24h_usd(&self, symbol: &str) -> ProviderResult<f64> {
        let response: TickerResponse = self
            .get_json("/fapi/v1/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;
        parse_number(&response.quote_volume, "quoteVolume")
    }
}

/// Smallest accepted depth limit covering `depth`.
fn depth_limit(depth: usize) -> usize {
    DEPTH_LIMITS
        .iter()
        .copied()
        .find(|limit| *limit >= depth)
        .unwrap_or(DEPTH_LIMITS[DEPTH_LIMITS.len() - 1])
}

fn parse_number(raw: &str, field: &str) -> ProviderResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProviderError::InvalidResponse(format!("{field}: not a number: {raw:?}")))
}

fn number_at(row: &[Value], index: usize, field: &str) -> ProviderResult<f64> {
    match row.get(index) {
        Some(Value::String(raw)) => parse_number(raw, field),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("{field}: out of range"))),
        _ => Err(ProviderError::InvalidResponse(format!("{field}: missing"))),
    }
}

fn millis_at(row: &[Value], index: usize, field: &str) -> ProviderResult<DateTime<Utc>> {
    row.get(index)
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| ProviderError::InvalidResponse(format!("{field}: invalid timestamp")))
}

/// Kline rows to closed candles, oldest first.
///
/// Rows whose close time is after `now` are still forming and dropped.
fn parse_klines(rows: &[Vec<Value>], now: DateTime<Utc>) -> ProviderResult<Vec<Candle>> {
    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let close_time = millis_at(row, 6, "closeTime")?;
        if close_time > now {
            continue;
        }
        candles.push(Candle::new(
            millis_at(row, 0, "openTime")?,
            number_at(row, 1, "open")?,
            number_at(row, 2, "high")?,
            number_at(row, 3, "low")?,
            number_at(row, 4, "close")?,
            number_at(row, 5, "volume")?,
            number_at(row, 7, "quoteVolume")?,
        ));
    }
    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

fn parse_levels(raw: &[(String, String)], depth: usize) -> ProviderResult<Vec<BookLevel>> {
    raw.iter()
        .take(depth)
        .map(|(price, size)| {
            Ok(BookLevel::new(
                parse_number(price, "price")?,
                parse_number(size, "size")?,
            ))
        })
        .collect()
}

fn parse_depth(symbol: &str, response: DepthResponse, depth: usize) -> ProviderResult<OrderBook> {
    Ok(OrderBook::new(
        symbol,
        parse_levels(&response.bids, depth)?,
        parse_levels(&response.asks, depth)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn kline(open_ms: i64, close_ms: i64, low: &str, high: &str) -> Vec<Value> {
        json!([
            open_ms, "100.0", high, low, "100.5", "12.5", close_ms, "1250.0", 42, "6.0", "600.0", "0"
        ])
        .as_array()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_depth_limit_rounds_up() {
        assert_eq!(depth_limit(5), 5);
        assert_eq!(depth_limit(50), 50);
        assert_eq!(depth_limit(200), 500);
        assert_eq!(depth_limit(5000), 1000);
    }

    #[test]
    fn test_parse_klines_drops_open_candle() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 20, 0).unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp_millis();
        let minute = 60_000;
        let rows = vec![
            kline(t0, t0 + 15 * minute - 1, "99.0", "101.0"),
            kline(t0 + 15 * minute, t0 + 30 * minute - 1, "98.0", "102.0"),
        ];

        let candles = parse_klines(&rows, now).unwrap();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open_time.timestamp_millis(), t0);
        assert_eq!(candles[0].low, 99.0);
        assert_eq!(candles[0].high, 101.0);
        assert_eq!(candles[0].volume, 12.5);
        assert_eq!(candles[0].quote_volume, 1250.0);
    }

    #[test]
    fn test_parse_klines_rejects_malformed_row() {
        let now = Utc::now();
        let rows = vec![json!([0, "100.0", "abc"]).as_array().cloned().unwrap()];
        assert!(matches!(
            parse_klines(&rows, now),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_depth_truncates_to_depth() {
        let response: DepthResponse = serde_json::from_value(json!({
            "lastUpdateId": 1,
            "E": 0,
            "T": 0,
            "bids": [["99.9", "1.5"], ["99.8", "2.0"], ["99.7", "3.0"]],
            "asks": [["100.1", "1.0"]]
        }))
        .unwrap();

        let book = parse_depth("BTCUSDT", response, 2).unwrap();

        assert_eq!(book.symbol, "BTCUSDT");
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.bids[1], BookLevel::new(99.8, 2.0));
        assert_eq!(book.asks.len(), 1);
    }

    #[test]
    fn test_ticker_quote_volume() {
        let response: TickerResponse = serde_json::from_value(json!({
            "symbol": "BTCUSDT",
            "volume": "1000.0",
            "quoteVolume": "65000000.25"
        }))
        .unwrap();
        assert_eq!(
            parse_number(&response.quote_volume, "quoteVolume").unwrap(),
            65_000_000.25
        );
        assert!(parse_number("NaN", "quoteVolume").is_err());
    }
}
