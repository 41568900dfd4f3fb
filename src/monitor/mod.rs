//! Position monitoring and alerting
//!
//! Evaluates tracked positions against live market state: how close
//! price is to each limit, how many dollars of competing bids stand
//! ahead of it, and which positions cross the alert threshold. The
//! evaluator is a pure function of (previous alert state, current
//! snapshot); all I/O happens in [`gather_quotes`].


use crate::client::MarketDataProvider;
use crate::error::Result;
use crate::positions::{normalize_market_slug, Position, PositionKey};
use crate::types::{OrderBook, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::warn;

/// A limit this far from price is likely stale and ignored by the market
pub const OUT_OF_RANGE_CENTS: Decimal = dec!(5);

/// Live state for one market, keyed by normalized slug
#[derive(Debug, Clone)]
pub struct MarketQuote {
    pub question: String,
    pub url: String,
    /// Fractions (0-1)
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub yes_book: OrderBook,
    pub no_book: OrderBook,
    /// The market has fully resolved
    pub closed: bool,
}

impl MarketQuote {
    pub fn price_for(&self, side: Side) -> Decimal {
        match side {
            Side::Yes => self.yes_price,
            Side::No => self.no_price,
        }
    }

    pub fn book_for(&self, side: Side) -> &OrderBook {
        match side {
            Side::Yes => &self.yes_book,
            Side::No => &self.no_book,
        }
    }
}

/// Price-derived fields of a resolved monitor row
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuote {
    pub current_price_cents: Decimal,
    /// Signed gap toward the side an adverse fill would come from:
    /// positive = safe, shrinking toward 0 = urgent, negative = the
    /// limit has been breached. A move away from the limit is not risk.
    pub distance_cents: Decimal,
    /// USD notional resting at or beyond the limit on the adverse side
    pub bids_before: Decimal,
    pub out_of_range: bool,
}

/// One evaluated position. `quote` is None when the market could not
/// be resolved (delisted or mistyped slug); such rows are surfaced for
/// the operator to act on, never silently dropped.
#[derive(Debug, Clone)]
pub struct MonitorRow {
    /// 1-based position index in the stored book
    pub index: usize,
    /// Normalized market slug
    pub slug: String,
    pub question: String,
    pub url: Option<String>,
    pub side: Side,
    pub limit_price_cents: Decimal,
    pub quote: Option<RowQuote>,
}

impl MonitorRow {
    pub fn is_resolved(&self) -> bool {
        self.quote.is_some()
    }
}

/// Which way price is moving relative to the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDirection {
    RisingToward,
    FallingToward,
}

/// Structured alert payload; delivery is the notifier's concern
#[derive(Debug, Clone)]
pub struct Alert {
    pub index: usize,
    pub question: String,
    pub url: String,
    pub side: Side,
    pub current_price_cents: Decimal,
    pub limit_price_cents: Decimal,
    pub distance_cents: Decimal,
    pub bids_before: Decimal,
    pub direction: AlertDirection,
}

/// Positions currently inside the alert threshold, keyed by stable
/// position identity so list edits cannot corrupt arm/disarm state.
/// Owned by the caller and threaded through each evaluation.
#[derive(Debug, Clone, Default)]
pub struct AlertState(HashSet<PositionKey>);

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &PositionKey) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of one monitor evaluation
#[derive(Debug)]
pub struct Evaluation {
    /// Risk-ordered: closest to being filled first, ties broken by
    /// thinnest competing bids; unresolved rows last in book order
    pub rows: Vec<MonitorRow>,
    /// Edge-triggered alerts for this cycle, in book order
    pub alerts: Vec<Alert>,
    /// Next cycle's previous state
    pub state: AlertState,
}

/// The pure evaluation core
#[derive(Debug, Clone)]
pub struct PositionMonitor {
    alert_threshold_cents: Decimal,
}

impl PositionMonitor {
    pub fn new(alert_threshold_cents: Decimal) -> Self {
        Self {
            alert_threshold_cents,
        }
    }

    /// Evaluate every position against the quote snapshot.
    ///
    /// An alert fires when a position's distance drops below the
    /// threshold on a cycle where it was not already below (edge
    /// triggered); crossing back above the threshold re-arms it.
    pub fn evaluate(
        &self,
        positions: &[Position],
        quotes: &HashMap<String, MarketQuote>,
        prev: &AlertState,
    ) -> Evaluation {
        let mut rows = Vec::with_capacity(positions.len());
        let mut alerts = Vec::new();
        let mut below = HashSet::new();

        for (i, position) in positions.iter().enumerate() {
            let index = i + 1;
            let key = position.key();

            let Some(market) = quotes.get(&key.slug) else {
                rows.push(MonitorRow {
                    index,
                    slug: key.slug,
                    question: position.market_slug.clone(),
                    url: None,
                    side: position.side,
                    limit_price_cents: position.limit_price_cents,
                    quote: None,
                });
                continue;
            };

            let current_price_cents = market.price_for(position.side) * dec!(100);
            let distance_cents = current_price_cents - position.limit_price_cents;
            let bids_before = market
                .book_for(position.side)
                .bid_notional_at_or_above(position.limit_price_fraction());

            rows.push(MonitorRow {
                index,
                slug: key.slug.clone(),
                question: market.question.clone(),
                url: Some(market.url.clone()),
                side: position.side,
                limit_price_cents: position.limit_price_cents,
                quote: Some(RowQuote {
                    current_price_cents,
                    distance_cents,
                    bids_before,
                    out_of_range: distance_cents >= OUT_OF_RANGE_CENTS,
                }),
            });

            if distance_cents < self.alert_threshold_cents {
                let newly_below = !prev.contains(&key);
                below.insert(key);
                if newly_below {
                    alerts.push(Alert {
                        index,
                        question: market.question.clone(),
                        url: market.url.clone(),
                        side: position.side,
                        current_price_cents,
                        limit_price_cents: position.limit_price_cents,
                        distance_cents,
                        bids_before,
                        direction: if current_price_cents < position.limit_price_cents {
                            AlertDirection::RisingToward
                        } else {
                            AlertDirection::FallingToward
                        },
                    });
                }
            }
        }

        // Stable sort: equal keys keep their original book order
        rows.sort_by(|a, b| match (&a.quote, &b.quote) {
            (Some(qa), Some(qb)) => qa
                .distance_cents
                .cmp(&qb.distance_cents)
                .then(qa.bids_before.cmp(&qb.bids_before)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Evaluation {
            rows,
            alerts,
            state: AlertState(below),
        }
    }
}

/// 1-based indices of positions whose market has fully resolved.
/// These are dead weight; the loop removes them from the book rather
/// than monitoring a price that can no longer move.
pub fn resolved_market_indices(
    positions: &[Position],
    quotes: &HashMap<String, MarketQuote>,
) -> Vec<usize> {
    positions
        .iter()
        .enumerate()
        .filter(|(_, position)| {
            quotes
                .get(&position.key().slug)
                .is_some_and(|quote| quote.closed)
        })
        .map(|(i, _)| i + 1)
        .collect()
}

/// Retry a fetch once before giving up; transient failures should cost
/// a cycle at most, never the process.
async fn retry_once<T, F, Fut>(mut fetch: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match fetch().await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Fetch failed, retrying once: {}", e);
            fetch().await
        }
    }
}

/// Fetch the quote snapshot for every distinct market in the book.
///
/// Markets the provider no longer knows are simply absent from the map
/// (the evaluator reports them unresolved). Order books are fetched
/// only for the sides actually held. Any transient failure, after one
/// retry, aborts the whole snapshot so the caller can skip the cycle
/// and keep its previous state.
pub async fn gather_quotes(
    provider: &dyn MarketDataProvider,
    positions: &[Position],
) -> Result<HashMap<String, MarketQuote>> {
    let mut wanted_sides: HashMap<String, (bool, bool)> = HashMap::new();
    for position in positions {
        let entry = wanted_sides
            .entry(normalize_market_slug(&position.market_slug))
            .or_default();
        match position.side {
            Side::Yes => entry.0 = true,
            Side::No => entry.1 = true,
        }
    }

    let mut quotes = HashMap::new();
    for (slug, (want_yes, want_no)) in wanted_sides {
        let Some(market) = retry_once(|| provider.market_by_slug(&slug)).await? else {
            continue;
        };

        let yes_book = match (want_yes, market.yes_token_id()) {
            (true, Some(token)) => retry_once(|| provider.order_book(token)).await?,
            _ => OrderBook::default(),
        };
        let no_book = match (want_no, market.no_token_id()) {
            (true, Some(token)) => retry_once(|| provider.order_book(token)).await?,
            _ => OrderBook::default(),
        };

        quotes.insert(
            slug,
            MarketQuote {
                question: market.question.clone(),
                url: market.url(),
                yes_price: market.yes_price(),
                no_price: market.no_price(),
                yes_book,
                no_book,
                closed: market.closed,
            },
        );
    }

    Ok(quotes)
}
