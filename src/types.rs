//! Core types shared across the sentinel

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which outcome token a position rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YES" => Ok(Side::Yes),
            "NO" => Ok(Side::No),
            other => Err(format!("side must be YES or NO, got '{}'", other)),
        }
    }
}

/// One Gamma market snapshot, already parsed and normalized.
///
/// Immutable: a fresh record is fetched each scan/poll cycle. Upstream
/// fields that fail to parse degrade to neutral defaults here so the
/// record is always well-formed.
#[derive(Debug, Clone)]
pub struct MarketRecord {
    pub question: String,
    pub slug: String,
    pub event_slug: Option<String>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Known spike window start, when the market carries one. Overrides
    /// end_date for time-risk purposes when nearer.
    pub known_spike_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Quoted spread as a fraction (0-1)
    pub spread: Decimal,
    /// Total liquidity in USD
    pub liquidity: Decimal,
    /// Exchange competitiveness score (0-1)
    pub competitiveness: Decimal,
    /// LP reward rate in USD per day
    pub daily_reward_rate: Decimal,
    /// Outcome prices as fractions, YES first
    pub outcome_prices: Vec<Decimal>,
    /// Lifetime volume in USD
    pub volume: Decimal,
    /// CLOB token ids, YES first
    pub clob_token_ids: Vec<String>,
    /// The market has fully resolved; tracked positions on it are dead
    pub closed: bool,
}

impl MarketRecord {
    /// YES price as a fraction; 0.5 when prices are missing
    pub fn yes_price(&self) -> Decimal {
        self.outcome_prices.first().copied().unwrap_or(dec!(0.5))
    }

    /// NO price as a fraction; complement of YES when absent
    pub fn no_price(&self) -> Decimal {
        self.outcome_prices
            .get(1)
            .copied()
            .unwrap_or_else(|| Decimal::ONE - self.yes_price())
    }

    pub fn price_for(&self, side: Side) -> Decimal {
        match side {
            Side::Yes => self.yes_price(),
            Side::No => self.no_price(),
        }
    }

    pub fn yes_token_id(&self) -> Option<&str> {
        self.clob_token_ids.first().map(String::as_str)
    }

    pub fn no_token_id(&self) -> Option<&str> {
        self.clob_token_ids.get(1).map(String::as_str)
    }

    pub fn token_id_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::Yes => self.yes_token_id(),
            Side::No => self.no_token_id(),
        }
    }

    /// Public market URL
    pub fn url(&self) -> String {
        match &self.event_slug {
            Some(event) => format!("https://polymarket.com/event/{}/{}", event, self.slug),
            None => format!("https://polymarket.com/event/{}", self.slug),
        }
    }
}

/// One resting order book level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Order book snapshot for a single outcome token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    /// USD notional resting in bids at or above `limit` (a fraction).
    ///
    /// This is the size that must trade through before a quote resting
    /// at `limit` is reached.
    pub fn bid_notional_at_or_above(&self, limit: Decimal) -> Decimal {
        self.bids
            .iter()
            .filter(|level| level.price >= limit)
            .map(|level| level.price * level.size)
            .sum()
    }
}
