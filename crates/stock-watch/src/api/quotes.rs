//! Yahoo Finance quote client

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Name shown when the provider does not report one
pub const UNKNOWN_NAME: &str = "Unknown";

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) stock-watch";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Point-in-time price snapshot for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub fetched_at: DateTime<Local>,
}

/// Anything that can produce a current quote for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

impl ChartError {
    fn summary(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{code}: {desc}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => "unknown provider error".to_string(),
        }
    }
}

/// Extract `(name, price)` from a chart endpoint body
fn parse_chart(symbol: &str, body: &str) -> Result<(String, f64)> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        return Err(WatchError::ApiError(error.summary()));
    }

    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
        .ok_or_else(|| WatchError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "empty chart result".to_string(),
        })?;

    let price = meta
        .regular_market_price
        .filter(|price| price.is_finite())
        .ok_or_else(|| WatchError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no regular market price".to_string(),
        })?;

    let name = meta
        .short_name
        .or(meta.long_name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    Ok((name, price))
}

/// Yahoo Finance chart-endpoint client
#[derive(Debug, Clone)]
pub struct YahooQuoteClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl YahooQuoteClient {
    /// Create a client using the configured timeout, host and rate limit
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.quote_rate_limit).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            base_url: config.quote_base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{symbol}", self.base_url)
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The chart endpoint explains most failures in its JSON body
            return match parse_chart(symbol, &body) {
                Err(WatchError::ApiError(reason)) => Err(WatchError::ApiError(reason)),
                _ => Err(WatchError::ApiError(format!("HTTP error: {status}"))),
            };
        }

        let (name, price) = parse_chart(symbol, &body)?;
        tracing::debug!(symbol, price, "quote fetched");

        Ok(Quote {
            symbol: symbol.to_string(),
            name,
            price,
            fetched_at: Local::now(),
        })
    }
}
