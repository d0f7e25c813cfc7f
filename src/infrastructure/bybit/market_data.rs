//! Bybit Market Data
//!
//! Closed linear-futures candles from the public v5 kline endpoint. Requests go
//! through the retrying HTTP client and a circuit breaker shared by every key.

use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::{Candle, CandleBatch, sanitize_series};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use crate::infrastructure::core::circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitBreakerError};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

/// Bybit caps a kline page at 1000 rows
const MAX_PAGE: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KlineEnvelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<KlineResult>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Vec<String>>,
}

/// Parses a v5 kline body into candles ordered oldest first.
///
/// Rows arrive newest first as `[start, open, high, low, close, volume, turnover]`;
/// malformed rows are dropped.
pub fn parse_kline_response(symbol: &str, body: &str) -> Result<Vec<Candle>> {
    let envelope: KlineEnvelope =
        serde_json::from_str(body).context("Failed to parse Bybit kline response")?;

    if envelope.ret_code != 0 {
        return Err(MarketDataError::ExchangeError {
            symbol: symbol.to_string(),
            code: envelope.ret_code,
            message: envelope.ret_msg,
        }
        .into());
    }

    let rows = envelope.result.map(|r| r.list).unwrap_or_default();
    let total = rows.len();
    let mut candles: Vec<Candle> = rows.iter().rev().filter_map(|row| parse_row(row)).collect();
    if total > 0 && candles.is_empty() {
        return Err(MarketDataError::InvalidData {
            symbol: symbol.to_string(),
            reason: format!("none of {} kline rows could be parsed", total),
        }
        .into());
    }
    if candles.len() < total {
        warn!(
            "BybitCandleSource [{}]: dropped {} malformed kline rows",
            symbol,
            total - candles.len()
        );
    }

    candles = sanitize_series(candles);
    Ok(candles)
}

fn parse_row(row: &[String]) -> Option<Candle> {
    if row.len() < 5 {
        return None;
    }
    let timestamp = row[0].parse::<i64>().ok()?;
    let price = |i: usize| Decimal::from_str(&row[i]).ok();
    let mut candle = Candle::new(timestamp, price(1)?, price(2)?, price(3)?, price(4)?);
    if let Some(volume) = row.get(5).and_then(|v| Decimal::from_str(v).ok()) {
        candle.volume = volume;
    }
    Some(candle)
}

/// Drops the candle that is still forming at `now_ms`
pub fn drop_unclosed(mut candles: Vec<Candle>, timeframe: Timeframe, now_ms: i64) -> Vec<Candle> {
    while candles
        .last()
        .is_some_and(|c| c.timestamp + timeframe.to_millis() > now_ms)
    {
        candles.pop();
    }
    candles
}

pub struct BybitCandleSource {
    client: ClientWithMiddleware,
    base_url: String,
    circuit_breaker: CircuitBreaker,
}

impl BybitCandleSource {
    pub fn new(base_url: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client: HttpClientFactory::create_client(max_retries),
            base_url: base_url.into(),
            circuit_breaker: CircuitBreaker::new("BybitKlines", BreakerSettings::default()),
        }
    }

    async fn fetch_page(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/v5/market/kline", self.base_url);
        let limit_str = limit.to_string();
        let url_with_query = build_url_with_query(
            &url,
            &[
                ("category", "linear"),
                ("symbol", symbol),
                ("interval", timeframe.to_bybit_string()),
                ("limit", limit_str.as_str()),
            ],
        );

        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .map_err(|e| MarketDataError::ConnectionLost {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Bybit kline response")?;

        if !status.is_success() {
            anyhow::bail!(
                "Bybit kline fetch for {} failed with {}: {}",
                symbol,
                status,
                body.chars().take(200).collect::<String>()
            );
        }

        parse_kline_response(symbol, &body)
    }
}

#[async_trait]
impl CandleSource for BybitCandleSource {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<CandleBatch> {
        // one extra row to replace the candle that is still forming
        let request = (limit + 1).min(MAX_PAGE);

        let candles = self
            .circuit_breaker
            .call(self.fetch_page(symbol, timeframe, request))
            .await
            .map_err(|e| match e {
                CircuitBreakerError::Open(msg) => anyhow::Error::new(MarketDataError::CircuitOpen {
                    service: msg,
                }),
                CircuitBreakerError::Inner(inner) => inner,
            })?;

        let mut candles = drop_unclosed(candles, timeframe, Utc::now().timestamp_millis());
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        debug!(
            "BybitCandleSource [{}/{}]: fetched {} closed candles",
            symbol,
            timeframe,
            candles.len()
        );
        Ok(CandleBatch::live(candles))
    }
}
