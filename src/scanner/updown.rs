//! Up/Down market watch
//!
//! Crypto and index "Up or Down" markets carry LP rewards but zero
//! spike risk until their window opens (the price cannot move while
//! the market is closed). The watch surfaces reward-bearing Up/Down
//! markets starting soon, once each.

use crate::scanner::MarketRow;
use crate::types::MarketRecord;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Alert horizon: only windows starting within this many hours qualify
const ALERT_HORIZON_HOURS: f64 = 1.5;

const ASSET_KEYWORDS: &[&str] = &[
    "bitcoin", "btc", "ethereum", "eth", "solana", "sol", "xrp", "crypto",
    "spx", "s&p", "sp500", "s&p 500", "nasdaq", "dow", "stock",
];

const UP_DOWN_PHRASES: &[&str] = &["up or down", "up/down"];

/// "February 13, 12:00PM-12:05PM ET" style windows embedded in questions
static TIME_WINDOW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z]+)\s+(\d{1,2}),\s+(\d{1,2}):(\d{2})(AM|PM)\s*-\s*(\d{1,2}):(\d{2})(AM|PM)\s*(ET|EST|EDT)",
    )
    .expect("time window pattern is valid")
});

/// One soon-starting Up/Down opportunity
#[derive(Debug, Clone)]
pub struct UpDownOpportunity {
    pub question: String,
    pub slug: String,
    pub url: String,
    pub start_time: DateTime<Utc>,
    pub hours_until_start: f64,
    pub daily_rewards: Decimal,
}

/// Is this a crypto or stock-index "Up or Down" price window market?
pub fn is_up_down_market(question: &str) -> bool {
    let q = question.to_lowercase();
    ASSET_KEYWORDS.iter().any(|k| q.contains(k))
        && UP_DOWN_PHRASES.iter().any(|p| q.contains(p))
}

/// Parse the trading window from the question text. ET is approximated
/// as UTC-4; the year is taken from `now`.
pub fn parse_time_window(
    question: &str,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let caps = TIME_WINDOW_PATTERN.captures(question)?;

    let month = month_number(caps.get(1)?.as_str())?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let start_hour = to_24h(caps.get(3)?.as_str().parse().ok()?, caps.get(5)?.as_str());
    let start_min: u32 = caps.get(4)?.as_str().parse().ok()?;
    let end_hour = to_24h(caps.get(6)?.as_str().parse().ok()?, caps.get(8)?.as_str());
    let end_min: u32 = caps.get(7)?.as_str().parse().ok()?;

    let year = now.year();
    let start = Utc
        .with_ymd_and_hms(year, month, day, start_hour, start_min, 0)
        .single()?
        + Duration::hours(4);
    let end = Utc
        .with_ymd_and_hms(year, month, day, end_hour, end_min, 0)
        .single()?
        + Duration::hours(4);

    Some((start, end))
}

fn month_number(name: &str) -> Option<u32> {
    let months = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];
    months
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

fn to_24h(hour: u32, ampm: &str) -> u32 {
    match (hour, ampm.eq_ignore_ascii_case("pm")) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    }
}

/// Session-scoped watch with per-slug alert deduplication
#[derive(Debug, Default)]
pub struct UpDownWatch {
    alerted: HashSet<String>,
}

impl UpDownWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find reward-bearing Up/Down markets whose window starts within
    /// the alert horizon and that have not been surfaced yet. Each slug
    /// is reported at most once per session.
    pub fn find_new(
        &mut self,
        markets: &[MarketRecord],
        rows: &[MarketRow],
        now: DateTime<Utc>,
    ) -> Vec<UpDownOpportunity> {
        let mut found = Vec::new();

        for market in markets {
            if !is_up_down_market(&market.question) || self.alerted.contains(&market.slug) {
                continue;
            }
            let Some((start, _end)) = parse_time_window(&market.question, now) else {
                continue;
            };
            let hours_until_start = (start - now).num_seconds() as f64 / 3600.0;
            if !(0.0..=ALERT_HORIZON_HOURS).contains(&hours_until_start) {
                continue;
            }
            let Some(row) = rows.iter().find(|r| r.slug == market.slug) else {
                continue;
            };

            self.alerted.insert(market.slug.clone());
            found.push(UpDownOpportunity {
                question: market.question.clone(),
                slug: market.slug.clone(),
                url: market.url(),
                start_time: start,
                hours_until_start,
                daily_rewards: row.daily_rewards,
            });
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::build_row;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 13, 15, 0, 0).unwrap()
    }

    fn updown_market(question: &str) -> MarketRecord {
        MarketRecord {
            question: question.to_string(),
            slug: "btc-up-or-down-feb-13".to_string(),
            event_slug: None,
            end_date: None,
            known_spike_date: None,
            spread: dec!(0.01),
            liquidity: dec!(20000),
            competitiveness: dec!(0.5),
            daily_reward_rate: dec!(25),
            outcome_prices: vec![dec!(0.5), dec!(0.5)],
            volume: dec!(50000),
            clob_token_ids: vec![],
            closed: false,
        }
    }

    #[test]
    fn detects_up_down_markets() {
        assert!(is_up_down_market(
            "Bitcoin Up or Down - February 13, 12:00PM-12:05PM ET"
        ));
        assert!(is_up_down_market("S&P 500 Up/Down today"));
        assert!(!is_up_down_market("Will Bitcoin hit $100k?"));
        assert!(!is_up_down_market("Will inflation rise this quarter?"));
    }

    #[test]
    fn parses_et_window_as_utc() {
        let (start, end) =
            parse_time_window("Bitcoin Up or Down - February 13, 12:00PM-12:05PM ET", now())
                .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 13, 16, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 13, 16, 5, 0).unwrap());
    }

    #[test]
    fn parses_noon_and_midnight_correctly() {
        let (start, _) =
            parse_time_window("Bitcoin Up or Down - February 13, 12:30AM-1:00AM ET", now())
                .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 13, 4, 30, 0).unwrap());
    }

    #[test]
    fn unparseable_window_is_none() {
        assert!(parse_time_window("Bitcoin Up or Down - sometime soon", now()).is_none());
    }

    #[test]
    fn watch_reports_each_market_once() {
        let market = updown_market("Bitcoin Up or Down - February 13, 12:00PM-12:05PM ET");
        let row = build_row(&market, now()).unwrap();
        let mut watch = UpDownWatch::new();

        let first = watch.find_new(&[market.clone()], &[row.clone()], now());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].slug, market.slug);
        assert!((first[0].hours_until_start - 1.0).abs() < 1e-9);

        let second = watch.find_new(&[market], &[row], now());
        assert!(second.is_empty());
    }

    #[test]
    fn watch_ignores_windows_outside_horizon() {
        // Starts 4 hours out (8:00PM ET = midnight UTC)
        let market = updown_market("Bitcoin Up or Down - February 13, 3:00PM-4:00PM ET");
        let row = build_row(&market, now()).unwrap();
        let mut watch = UpDownWatch::new();
        assert!(watch.find_new(&[market], &[row], now()).is_empty());
    }
}
