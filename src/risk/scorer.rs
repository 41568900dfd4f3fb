//! Composite risk scoring
//!
//! Composite = 50% spike + 30% time proximity + 20% adverse selection.
//! The scorer always returns a number for every market: missing or
//! unparseable fields degrade to documented neutral defaults, never to
//! an error, so one bad record cannot disappear from a ranked list.

use super::classifier::{EventCategory, EventClassification};
use crate::types::MarketRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Risk breakdown for one market. Recomputed every evaluation; markets
/// move continuously, so caching would silently go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskBreakdown {
    /// 0-100, one decimal
    pub composite: Decimal,
    pub spike_risk: Decimal,
    /// 0-100 integer, step function of hours remaining
    pub time_risk: u32,
    pub adverse_selection_risk: Decimal,
    pub category: EventCategory,
    pub is_binary_event: bool,
}

/// Time risk when no resolution date is known at all
const TIME_RISK_NEUTRAL: u32 = 40;

/// (upper bound in hours, risk) bands. Fixed breakpoints, not
/// interpolated: discrete news-cycle regimes, not continuous decay.
const TIME_RISK_BANDS: &[(f64, u32)] = &[
    (0.0, 100),
    (6.0, 98),
    (24.0, 90),
    (72.0, 75),
    (168.0, 55),
    (720.0, 35),
    (2160.0, 20),
];

const TIME_RISK_FLOOR: u32 = 8;

/// Time-to-resolution risk, 0-100. Uses the nearer of end date and
/// known spike date; a market already past its date scores maximal.
pub fn time_proximity_risk(
    end_date: Option<DateTime<Utc>>,
    known_spike_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u32 {
    let hours_remaining = [end_date, known_spike_date]
        .into_iter()
        .flatten()
        .map(|d| (d - now).num_seconds() as f64 / 3600.0)
        .fold(None, |acc: Option<f64>, h| {
            Some(acc.map_or(h, |a| a.min(h)))
        });

    let Some(hours) = hours_remaining else {
        return TIME_RISK_NEUTRAL;
    };

    for (bound, risk) in TIME_RISK_BANDS {
        if hours < *bound {
            return *risk;
        }
    }
    TIME_RISK_FLOOR
}

/// Adverse-selection risk, 0-100: price extremity + liquidity depth +
/// competition, capped at 100.
pub fn adverse_selection_risk(market: &MarketRecord) -> Decimal {
    // A price far from 0.5 means one side already "knows"; a stale
    // quote there is a target. Max 40 by construction.
    let extremity = (market.yes_price() - dec!(0.5)).abs() * dec!(80);

    let liquidity_risk = if market.liquidity < dec!(10000) {
        dec!(30)
    } else if market.liquidity < dec!(50000) {
        dec!(20)
    } else if market.liquidity < dec!(200000) {
        dec!(10)
    } else {
        dec!(5)
    };

    let competition_risk = (Decimal::ONE - market.competitiveness) * dec!(30);

    (extremity + liquidity_risk + competition_risk).min(dec!(100))
}

/// Score a market at an explicit instant. Pure; `now` is injected so
/// the bands are testable.
pub fn score_at(
    market: &MarketRecord,
    classification: &EventClassification,
    now: DateTime<Utc>,
) -> RiskBreakdown {
    let time_risk = time_proximity_risk(market.end_date, market.known_spike_date, now);
    let adverse = adverse_selection_risk(market);

    // An imminent binary resolution is strictly more dangerous than
    // either factor alone.
    let mut spike = classification.base_spike_risk;
    if classification.is_binary && time_risk > 70 {
        spike = (spike * dec!(1.15)).min(dec!(100));
    }

    let composite = (spike * dec!(0.50)
        + Decimal::from(time_risk) * dec!(0.30)
        + adverse * dec!(0.20))
    .round_dp(1);

    RiskBreakdown {
        composite,
        spike_risk: spike.round_dp(1),
        time_risk,
        adverse_selection_risk: adverse.round_dp(1),
        category: classification.category,
        is_binary_event: classification.is_binary,
    }
}

/// Score a market against the current clock
pub fn score(market: &MarketRecord, classification: &EventClassification) -> RiskBreakdown {
    score_at(market, classification, Utc::now())
}

/// Human-readable risk label
pub fn risk_label(score: Decimal) -> &'static str {
    if score <= dec!(25) {
        "Low"
    } else if score <= dec!(45) {
        "Moderate"
    } else if score <= dec!(65) {
        "Elevated"
    } else if score <= dec!(80) {
        "High"
    } else {
        "Extreme"
    }
}
