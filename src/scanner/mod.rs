//! Low-risk LP market scanner
//!
//! Builds enriched rows from reward markets and ranks them by capital
//! efficiency for the scanner view.

pub mod updown;

use crate::risk::{self, EventCategory, RiskBreakdown};
use crate::types::MarketRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Days assumed remaining when a market has no end date
const DEFAULT_DAYS_REMAINING: i64 = 365;

/// One enriched scanner row
#[derive(Debug, Clone)]
pub struct MarketRow {
    pub question: String,
    pub slug: String,
    pub url: String,
    pub daily_rewards: Decimal,
    pub days_remaining: i64,
    pub min_capital_estimate: Decimal,
    pub liquidity: Decimal,
    pub volume: Decimal,
    pub end_date_readable: String,
    pub spread_cents: Decimal,
    pub yes_price: Decimal,
    pub risk: RiskBreakdown,
    /// Daily rewards per dollar of estimated minimum capital
    pub capital_efficiency: Decimal,
    pub estimated_apy: Decimal,
}

/// Estimated minimum capital to earn a qualifying share of rewards:
/// 1% of pool liquidity, floored at $100.
pub fn min_capital_estimate(liquidity: Decimal) -> Decimal {
    (liquidity * dec!(0.01)).max(dec!(100))
}

/// Whole days until resolution, floored at zero; 365 when unknown
pub fn days_remaining(end_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match end_date {
        Some(end) => (end - now).num_days().max(0),
        None => DEFAULT_DAYS_REMAINING,
    }
}

/// Human-readable resolution date, e.g. "December 31, 2026"
pub fn format_end_date(end_date: Option<DateTime<Utc>>) -> String {
    match end_date {
        Some(end) => end.format("%B %d, %Y").to_string(),
        None => "unknown".to_string(),
    }
}

/// Build one enriched row. Returns None only for markets that carry no
/// positive daily reward rate.
pub fn build_row(market: &MarketRecord, now: DateTime<Utc>) -> Option<MarketRow> {
    if market.daily_reward_rate <= Decimal::ZERO {
        return None;
    }

    let classification = risk::classify(&market.question);
    let breakdown = risk::score_at(market, &classification, now);

    let min_capital = min_capital_estimate(market.liquidity);
    let capital_efficiency = (market.daily_reward_rate / min_capital).round_dp(4);
    let estimated_apy = (market.daily_reward_rate / min_capital * dec!(365) * dec!(100)).round_dp(2);

    Some(MarketRow {
        question: market.question.clone(),
        slug: market.slug.clone(),
        url: market.url(),
        daily_rewards: market.daily_reward_rate.round_dp(2),
        days_remaining: days_remaining(market.end_date, now),
        min_capital_estimate: min_capital.round_dp(2),
        liquidity: market.liquidity.round_dp(2),
        volume: market.volume.round_dp(2),
        end_date_readable: format_end_date(market.end_date),
        spread_cents: (market.spread * dec!(100)).round_dp(2),
        yes_price: market.yes_price(),
        risk: breakdown,
        capital_efficiency,
        estimated_apy,
    })
}

/// Filter to the low-risk set and order it: best reward-per-dollar
/// first, ties broken by raw daily rewards. Asset-price markets are
/// excluded outright regardless of score.
pub fn rank_low_risk(
    mut rows: Vec<MarketRow>,
    max_risk: Decimal,
    min_volume: Decimal,
) -> Vec<MarketRow> {
    rows.retain(|r| {
        r.risk.category != EventCategory::AssetPrice
            && r.risk.composite <= max_risk
            && r.volume >= min_volume
    });
    rows.sort_by(|a, b| {
        b.capital_efficiency
            .cmp(&a.capital_efficiency)
            .then(b.daily_rewards.cmp(&a.daily_rewards))
    });
    rows
}

/// Short operator-facing reasoning paragraph for a row
pub fn reasoning(row: &MarketRow) -> String {
    let mut parts = vec![format!(
        "This market resolves on {}, leaving ~{} days to farm LP rewards.",
        row.end_date_readable, row.days_remaining
    )];

    if row.volume < dec!(50000) && row.liquidity < dec!(20000) {
        parts.push(
            "Low total volume and liquidity - consider sizing down or monitoring spread."
                .to_string(),
        );
    } else if row.volume < dec!(200000) {
        parts.push("Moderate volume; liquidity is adequate but not deep.".to_string());
    } else {
        parts.push("Solid volume and liquidity for the size of the market.".to_string());
    }

    match row.risk.category {
        EventCategory::Scheduled => parts.push(
            "Risk is scheduled: there is a known window when the outcome can move sharply."
                .to_string(),
        ),
        EventCategory::Binary => parts.push(
            "Binary-style event - a single headline could move the market sharply; keep position size in check."
                .to_string(),
        ),
        EventCategory::Gradual => parts.push(
            "Gradual-type event; probability tends to move incrementally rather than in one spike."
                .to_string(),
        ),
        _ => parts.push(
            "Event type is generic; monitor for news that could create a sudden move.".to_string(),
        ),
    }

    let q = row.question.to_lowercase();
    if ["opening weekend", "box office", "top grossing", "movie", "film"]
        .iter()
        .any(|t| q.contains(t))
    {
        parts.push(
            "Performance of related releases through the year may move the probability; no fixed release calendar is applied here."
                .to_string(),
        );
    }

    parts.join(" ")
}
