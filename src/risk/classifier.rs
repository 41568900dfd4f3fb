//! Event classification for spike risk
//!
//! Maps a market's question text to an event category and a base spike
//! risk. Matching is case-insensitive substring lookup over per-category
//! trigger tables, plus one regex for congressional-district tokens
//! ("PA-03", "FL-19") which marks a market as scheduled.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Event category, ordered here by how violently the price tends to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Commodity/crypto/index price bets: one pump or dump can move the
    /// price violently, so these never qualify as low-risk LP targets
    AssetPrice,
    /// Single-headline events (resignations, strikes, announcements)
    Binary,
    /// Events with a known resolution window (FOMC, elections, earnings)
    Scheduled,
    /// Slow-moving aggregates (GDP, subscriber counts)
    Gradual,
    Unknown,
}

impl EventCategory {
    pub fn base_spike_risk(self) -> Decimal {
        match self {
            EventCategory::AssetPrice => dec!(72),
            EventCategory::Binary => dec!(85),
            EventCategory::Scheduled => dec!(65),
            EventCategory::Gradual => dec!(25),
            EventCategory::Unknown => dec!(50),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::AssetPrice => "asset_price",
            EventCategory::Binary => "binary",
            EventCategory::Scheduled => "scheduled",
            EventCategory::Gradual => "gradual",
            EventCategory::Unknown => "unknown",
        }
    }
}

/// Classification result. Flags reflect each trigger table
/// independently; `category` is the precedence winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventClassification {
    pub category: EventCategory,
    pub base_spike_risk: Decimal,
    pub is_binary: bool,
    pub is_scheduled: bool,
    pub is_gradual: bool,
    pub is_asset_price: bool,
}

const BINARY_TRIGGERS: &[&str] = &[
    "resign", "resigns", "out as", "step down", "fired", "removed",
    "strike", "strikes", "attack", "invade", "invasion", "war",
    "die", "dies", "death", "assassin",
    "announce", "announcement", "declare",
    "shut down", "shutdown", "default",
    "ceasefire", "peace deal", "treaty",
];

const SCHEDULED_TRIGGERS: &[&str] = &[
    "fed ", "fomc", "interest rate", "rate cut", "rate hike",
    "election", "vote", "referendum",
    "nominee", "nomination", "primary", "democratic nominee",
    "republican nominee", "general election",
    "super bowl", "world cup", "championship", "finals",
    "earnings", "quarterly", "q1", "q2", "q3", "q4",
    "meeting", "summit", "conference",
];

const ASSET_PRICE_TRIGGERS: &[&str] = &[
    "bitcoin", "btc", "eth", "crypto", "price above", "price below",
    "stock", "s&p", "nasdaq", "dow", "spx", "sp500",
    "silver", "gold", " hit ", " above $", " below $",
    "close over", "close above", "close below",
    " (si)", " (gc)", "gc)", "si)",
];

const GRADUAL_TRIGGERS: &[&str] = &[
    "gdp", "inflation", "unemployment",
    "subscribers", "followers", "views", "streams",
    "before gta", "by end of year", "by 2027", "by 2028",
];

/// Trigger tables in precedence order: the first matching entry wins
/// the category. Asset-price comes first and is exclusive - its risk
/// profile must never be diluted by a co-occurring long-horizon phrase.
const RULES: &[(EventCategory, &[&str])] = &[
    (EventCategory::AssetPrice, ASSET_PRICE_TRIGGERS),
    (EventCategory::Binary, BINARY_TRIGGERS),
    (EventCategory::Scheduled, SCHEDULED_TRIGGERS),
    (EventCategory::Gradual, GRADUAL_TRIGGERS),
];

/// Congressional district tokens ("PA-03") imply a scheduled
/// primary/nomination. Matched against the raw question; the pattern
/// is case-sensitive by construction.
static DISTRICT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2}-\d{1,2}\b").expect("district pattern is valid"));

fn any_trigger(question: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|t| question.contains(t))
}

/// Classify a market question. Pure and deterministic.
pub fn classify(question: &str) -> EventClassification {
    let q = question.to_lowercase();
    let district = DISTRICT_PATTERN.is_match(question);

    let is_asset_price = any_trigger(&q, ASSET_PRICE_TRIGGERS);
    let is_binary = any_trigger(&q, BINARY_TRIGGERS);
    let is_scheduled = any_trigger(&q, SCHEDULED_TRIGGERS) || district;
    let is_gradual = any_trigger(&q, GRADUAL_TRIGGERS);

    let category = RULES
        .iter()
        .find(|(cat, triggers)| {
            any_trigger(&q, triggers) || (*cat == EventCategory::Scheduled && district)
        })
        .map(|(cat, _)| *cat)
        .unwrap_or(EventCategory::Unknown);

    EventClassification {
        category,
        base_spike_risk: category.base_spike_risk(),
        is_binary,
        is_scheduled,
        is_gradual,
        is_asset_price,
    }
}
