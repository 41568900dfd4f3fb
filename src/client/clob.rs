//! CLOB API client
//!
//! Read-only order-book snapshots; the sentinel never trades.

use super::lenient_decimal;
use crate::error::Result;
use crate::types::{BookLevel, OrderBook};
use reqwest::Client;
use serde::Deserialize;

/// CLOB order-book client
#[derive(Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    bids: Option<Vec<RawLevel>>,
    asks: Option<Vec<RawLevel>>,
}

/// Level size arrives under different names depending on endpoint age
#[derive(Debug, Deserialize)]
struct RawLevel {
    price: Option<serde_json::Value>,
    #[serde(alias = "quantity", alias = "remaining")]
    size: Option<serde_json::Value>,
}

impl ClobClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the order book for one outcome token. Malformed levels
    /// are skipped; a market with no book yields an empty one.
    pub async fn get_order_book(&self, token_id: &str) -> Result<OrderBook> {
        let url = format!("{}/book", self.base_url);
        let raw: RawBook = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(OrderBook {
            bids: parse_levels(raw.bids),
            asks: parse_levels(raw.asks),
        })
    }
}

fn parse_levels(levels: Option<Vec<RawLevel>>) -> Vec<BookLevel> {
    levels
        .unwrap_or_default()
        .into_iter()
        .filter_map(|level| {
            Some(BookLevel {
                price: lenient_decimal(level.price.as_ref())?,
                size: lenient_decimal(level.size.as_ref())?,
            })
        })
        .collect()
}
