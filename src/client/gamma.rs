//! Gamma API client for market data
//!
//! Fetches reward-bearing markets (paginated) and single markets by
//! slug. Parsing is deliberately lenient: Gamma mixes strings and
//! numbers across fields, and a malformed field must degrade to a
//! neutral default rather than drop the market.

use super::lenient_decimal;
use crate::error::Result;
use crate::positions::normalize_market_slug;
use crate::types::MarketRecord;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

/// Markets per pagination page
const PAGE_LIMIT: usize = 100;

/// Gamma API client
#[derive(Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GammaMarket {
    question: Option<String>,
    slug: Option<String>,
    #[serde(rename = "eventSlug")]
    event_slug: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    #[serde(rename = "knownSpikeDate")]
    known_spike_date: Option<String>,
    spread: Option<serde_json::Value>,
    liquidity: Option<serde_json::Value>,
    competitive: Option<serde_json::Value>,
    volume: Option<serde_json::Value>,
    #[serde(rename = "outcomePrices")]
    outcome_prices: Option<serde_json::Value>,
    #[serde(rename = "clobTokenIds")]
    clob_token_ids: Option<String>,
    #[serde(rename = "clobRewards")]
    clob_rewards: Option<Vec<ClobReward>>,
    closed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClobReward {
    #[serde(rename = "rewardsDailyRate")]
    rewards_daily_rate: Option<serde_json::Value>,
}

impl GammaClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the complete snapshot of active markets carrying LP
    /// rewards, walking offset pagination to the end.
    pub async fn get_reward_markets(&self) -> Result<Vec<MarketRecord>> {
        let url = format!("{}/markets", self.base_url);
        let mut markets = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: Vec<GammaMarket> = self
                .http
                .get(&url)
                .query(&[
                    ("active", "true"),
                    ("closed", "false"),
                    ("limit", &PAGE_LIMIT.to_string()),
                    ("offset", &offset.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let page_len = page.len();
            markets.extend(
                page.into_iter()
                    .map(parse_market)
                    .filter(|m| m.daily_reward_rate > Decimal::ZERO),
            );

            if page_len < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
            debug!("Fetched {} reward markets so far...", markets.len());
        }

        Ok(markets)
    }

    /// Fetch one market by slug (raw slug, path, or URL accepted).
    /// Ok(None) when the market no longer exists.
    pub async fn get_market_by_slug(&self, slug: &str) -> Result<Option<MarketRecord>> {
        let norm = normalize_market_slug(slug);
        let url = format!("{}/markets", self.base_url);

        let resp: Vec<GammaMarket> = self
            .http
            .get(&url)
            .query(&[("slug", norm.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.into_iter().next().map(parse_market))
    }
}

/// ISO timestamps arrive with either Z or explicit offsets
fn parse_date(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

/// Prices arrive as a JSON array, or as a string containing a JSON
/// array of strings or numbers (sometimes single-quoted). Anything
/// unparseable yields an empty list, i.e. the even 0.5/0.5 default.
fn parse_price_list(value: Option<&serde_json::Value>) -> Vec<Decimal> {
    let values: Vec<serde_json::Value> = match value {
        Some(serde_json::Value::Array(items)) => items.clone(),
        Some(serde_json::Value::String(s)) => {
            serde_json::from_str(&s.replace('\'', "\"")).unwrap_or_default()
        }
        _ => Vec::new(),
    };

    values
        .iter()
        .filter_map(|v| lenient_decimal(Some(v)))
        .collect()
}

fn parse_token_ids(raw: Option<&String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        .unwrap_or_default()
}

fn parse_market(gm: GammaMarket) -> MarketRecord {
    let daily_reward_rate = gm
        .clob_rewards
        .as_ref()
        .and_then(|rewards| rewards.first())
        .and_then(|r| lenient_decimal(r.rewards_daily_rate.as_ref()))
        .unwrap_or(Decimal::ZERO);

    MarketRecord {
        question: gm.question.unwrap_or_default(),
        slug: gm.slug.unwrap_or_default(),
        event_slug: gm.event_slug,
        end_date: parse_date(gm.end_date.as_ref()),
        known_spike_date: parse_date(gm.known_spike_date.as_ref()),
        spread: lenient_decimal(gm.spread.as_ref()).unwrap_or(dec!(0.05)),
        liquidity: lenient_decimal(gm.liquidity.as_ref()).unwrap_or(Decimal::ZERO),
        competitiveness: lenient_decimal(gm.competitive.as_ref())
            .unwrap_or(Decimal::ZERO)
            .clamp(Decimal::ZERO, Decimal::ONE),
        daily_reward_rate,
        outcome_prices: parse_price_list(gm.outcome_prices.as_ref()),
        volume: lenient_decimal(gm.volume.as_ref()).unwrap_or(Decimal::ZERO),
        clob_token_ids: parse_token_ids(gm.clob_token_ids.as_ref()),
        closed: gm.closed.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gamma_market(json: &str) -> GammaMarket {
        serde_json::from_str(json).expect("fixture parses")
    }

    #[test]
    fn parses_typical_gamma_payload() {
        let gm = gamma_market(
            r#"{
                "question": "Will Fed cut rates in March?",
                "slug": "fed-cuts-march",
                "eventSlug": "fed-decision",
                "endDate": "2026-03-18T18:00:00Z",
                "spread": 0.02,
                "liquidity": "255980.5",
                "competitive": 0.888,
                "volume": "1200000",
                "outcomePrices": "[\"0.145\", \"0.855\"]",
                "clobTokenIds": "[\"111\", \"222\"]",
                "clobRewards": [{"rewardsDailyRate": 95}]
            }"#,
        );
        let m = parse_market(gm);
        assert_eq!(m.slug, "fed-cuts-march");
        assert_eq!(m.yes_price(), dec!(0.145));
        assert_eq!(m.no_price(), dec!(0.855));
        assert_eq!(m.liquidity, dec!(255980.5));
        assert_eq!(m.daily_reward_rate, dec!(95));
        assert_eq!(m.yes_token_id(), Some("111"));
        assert!(m.end_date.is_some());
        assert_eq!(m.url(), "https://polymarket.com/event/fed-decision/fed-cuts-march");
    }

    #[test]
    fn malformed_fields_degrade_to_neutral_defaults() {
        let gm = gamma_market(
            r#"{
                "question": "Sparse market",
                "slug": "sparse",
                "endDate": "not-a-date",
                "outcomePrices": "garbage",
                "clobTokenIds": "also garbage"
            }"#,
        );
        let m = parse_market(gm);
        assert!(m.end_date.is_none());
        assert_eq!(m.yes_price(), dec!(0.5));
        assert_eq!(m.no_price(), dec!(0.5));
        assert_eq!(m.spread, dec!(0.05));
        assert_eq!(m.liquidity, Decimal::ZERO);
        assert_eq!(m.daily_reward_rate, Decimal::ZERO);
        assert!(m.clob_token_ids.is_empty());
    }

    #[test]
    fn single_quoted_price_strings_are_accepted() {
        let gm = gamma_market(
            r#"{"question": "q", "slug": "s", "outcomePrices": "['0.3', '0.7']"}"#,
        );
        let m = parse_market(gm);
        assert_eq!(m.yes_price(), dec!(0.3));
    }

    #[test]
    fn competitiveness_is_clamped() {
        let gm = gamma_market(r#"{"question": "q", "slug": "s", "competitive": 1.7}"#);
        assert_eq!(parse_market(gm).competitiveness, Decimal::ONE);
    }
}
