//! Polymarket API clients
//!
//! Three public read-only surfaces: Gamma (market metadata), CLOB
//! (order books), and the Data API (wallet positions). No keys, no
//! authentication; the sentinel never places or cancels orders.

mod clob;
mod data;
mod gamma;

pub use clob::ClobClient;
pub use data::{DataClient, UserPosition};
pub use gamma::GammaClient;

use crate::config::PolymarketConfig;
use crate::error::Result;
use crate::types::{MarketRecord, OrderBook};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Shared HTTP client settings
const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "lp-sentinel/0.1 (LP rewards analyzer)";

pub(crate) fn build_http() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Parse a Decimal out of a JSON value that may arrive as a string or
/// a number. Gamma is inconsistent about this across fields.
pub(crate) fn lenient_decimal(value: Option<&serde_json::Value>) -> Option<Decimal> {
    match value? {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        _ => None,
    }
}

/// The narrow market-data interface the monitor loop consumes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Resolve one market by slug; Ok(None) when it no longer exists
    async fn market_by_slug(&self, slug: &str) -> Result<Option<MarketRecord>>;

    /// Order book for one outcome token
    async fn order_book(&self, token_id: &str) -> Result<OrderBook>;
}

/// Bundle of all three API clients
#[derive(Clone)]
pub struct PolymarketClient {
    pub gamma: GammaClient,
    pub clob: ClobClient,
    pub data: DataClient,
}

impl PolymarketClient {
    pub fn new(config: &PolymarketConfig) -> Result<Self> {
        let http = build_http()?;
        Ok(Self {
            gamma: GammaClient::new(http.clone(), &config.gamma_url),
            clob: ClobClient::new(http.clone(), &config.clob_url),
            data: DataClient::new(http, &config.data_api_url),
        })
    }
}

#[async_trait]
impl MarketDataProvider for PolymarketClient {
    async fn market_by_slug(&self, slug: &str) -> Result<Option<MarketRecord>> {
        self.gamma.get_market_by_slug(slug).await
    }

    async fn order_book(&self, token_id: &str) -> Result<OrderBook> {
        self.clob.get_order_book(token_id).await
    }
}
