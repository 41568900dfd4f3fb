//! Data API client
//!
//! Read-only wallet positions by public proxy address. No private key
//! or authentication involved.

use super::lenient_decimal;
use crate::error::Result;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Positions per pagination page
const PAGE_LIMIT: usize = 500;

/// Data API client
#[derive(Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

/// One open position as the Data API reports it
#[derive(Debug, Clone)]
pub struct UserPosition {
    pub title: String,
    pub outcome: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub cur_price: Decimal,
    pub cash_pnl: Decimal,
    pub percent_pnl: Decimal,
    pub slug: String,
    pub event_slug: String,
}

impl UserPosition {
    pub fn url(&self) -> Option<String> {
        match (self.event_slug.is_empty(), self.slug.is_empty()) {
            (false, false) => Some(format!(
                "https://polymarket.com/event/{}/{}",
                self.event_slug, self.slug
            )),
            (_, false) => Some(format!("https://polymarket.com/event/{}", self.slug)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUserPosition {
    title: Option<String>,
    outcome: Option<String>,
    size: Option<serde_json::Value>,
    #[serde(rename = "avgPrice")]
    avg_price: Option<serde_json::Value>,
    #[serde(rename = "curPrice")]
    cur_price: Option<serde_json::Value>,
    #[serde(rename = "cashPnl")]
    cash_pnl: Option<serde_json::Value>,
    #[serde(rename = "percentPnl")]
    percent_pnl: Option<serde_json::Value>,
    slug: Option<String>,
    #[serde(rename = "eventSlug")]
    event_slug: Option<String>,
}

impl DataClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch all open positions for a wallet address, walking offset
    /// pagination to the end.
    pub async fn get_user_positions(&self, address: &str) -> Result<Vec<UserPosition>> {
        let url = format!("{}/positions", self.base_url);
        let mut positions = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: Vec<RawUserPosition> = self
                .http
                .get(&url)
                .query(&[
                    ("user", address),
                    ("sizeThreshold", "0"),
                    ("limit", &PAGE_LIMIT.to_string()),
                    ("offset", &offset.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let page_len = page.len();
            positions.extend(page.into_iter().map(parse_position));

            if page_len < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(positions)
    }
}

fn parse_position(raw: RawUserPosition) -> UserPosition {
    UserPosition {
        title: raw.title.unwrap_or_else(|| "(untitled market)".to_string()),
        outcome: raw.outcome.unwrap_or_else(|| "N/A".to_string()),
        size: lenient_decimal(raw.size.as_ref()).unwrap_or(Decimal::ZERO),
        avg_price: lenient_decimal(raw.avg_price.as_ref()).unwrap_or(Decimal::ZERO),
        cur_price: lenient_decimal(raw.cur_price.as_ref()).unwrap_or(Decimal::ZERO),
        cash_pnl: lenient_decimal(raw.cash_pnl.as_ref()).unwrap_or(Decimal::ZERO),
        percent_pnl: lenient_decimal(raw.percent_pnl.as_ref()).unwrap_or(Decimal::ZERO),
        slug: raw.slug.unwrap_or_default(),
        event_slug: raw.event_slug.unwrap_or_default(),
    }
}
