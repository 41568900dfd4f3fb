//! Tracked LP positions
//!
//! The ordered position book the monitor watches, plus the structured
//! operations the command surface applies to it. Mutations never save
//! implicitly; callers persist via [`PositionBook::save`] once an
//! operation has fully succeeded.

mod store;
#[cfg(test)]
mod tests;

use crate::config::AddSemantics;
use crate::error::{Result, SentinelError};
use crate::types::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// One tracked LP limit order. Market and side are immutable after
/// creation; only the price can be edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Slug, event path, or full URL as the operator entered it
    pub market_slug: String,
    pub side: Side,
    /// Limit price in cents, exclusive bounds (0, 100)
    pub limit_price_cents: Decimal,
    #[serde(default)]
    pub notes: String,
}

impl Position {
    /// Stable identity: normalized slug + side. Alert state is keyed by
    /// this, not by list index, so edits elsewhere in the book cannot
    /// corrupt arm/disarm state.
    pub fn key(&self) -> PositionKey {
        PositionKey {
            slug: normalize_market_slug(&self.market_slug),
            side: self.side,
        }
    }

    /// Limit price as a fraction (0-1) for order-book comparisons
    pub fn limit_price_fraction(&self) -> Decimal {
        self.limit_price_cents / dec!(100)
    }
}

/// Position identity surviving reordering of the book
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub slug: String,
    pub side: Side,
}

/// Normalize operator input into a bare market slug.
///
/// Accepts a raw slug, an `event-slug/market-slug` path, or a full
/// polymarket.com URL; always returns the final path segment.
pub fn normalize_market_slug(input: &str) -> String {
    let trimmed = input.trim();
    let path = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .map(|rest| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(trimmed);
    let path = path.split(['?', '#']).next().unwrap_or(path);

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or(trimmed)
        .to_string()
}

/// Enforce the exclusive (0, 100) cent bounds on a limit price
pub fn validate_price_cents(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO || price >= dec!(100) {
        return Err(SentinelError::InvalidCommand(format!(
            "limit price must be between 0 and 100 cents exclusive, got {}",
            price
        )));
    }
    Ok(())
}

/// Outcome of an add operation
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added,
    /// An existing (market, side) position had its price replaced
    Updated { old_price: Decimal },
}

/// Outcome of a price edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub market_slug: String,
    pub side: Side,
    pub old_price: Decimal,
    pub new_price: Decimal,
}

/// One removed position with the 1-based index it held
#[derive(Debug, Clone)]
pub struct RemovedPosition {
    pub index: usize,
    pub position: Position,
}

/// Outcome of a bulk remove
#[derive(Debug, Clone, Default)]
pub struct RemoveReport {
    pub removed: Vec<RemovedPosition>,
    pub out_of_range: Vec<usize>,
}

/// Outcome of a bulk add
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// The ordered, persisted position book
#[derive(Debug)]
pub struct PositionBook {
    positions: Vec<Position>,
    path: PathBuf,
    semantics: AddSemantics,
}

impl PositionBook {
    /// Load the book from disk; a missing file is an empty book.
    /// Indices renumber densely 1..N in stored order.
    pub fn load(path: PathBuf, semantics: AddSemantics) -> Result<Self> {
        let positions = store::load(&path)?;
        Ok(Self {
            positions,
            path,
            semantics,
        })
    }

    /// In-memory book, for tests and one-shot CLI use
    pub fn in_memory(path: PathBuf, semantics: AddSemantics) -> Self {
        Self {
            positions: Vec::new(),
            path,
            semantics,
        }
    }

    /// Persist the whole book atomically
    pub fn save(&self) -> Result<()> {
        store::save(&self.path, &self.positions)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 0-based index of an existing position on the same normalized
    /// market slug and side
    pub fn find(&self, slug_or_url: &str, side: Side) -> Option<usize> {
        let target = normalize_market_slug(slug_or_url);
        self.positions
            .iter()
            .position(|p| p.side == side && normalize_market_slug(&p.market_slug) == target)
    }

    /// Add a position, or update the existing one per the configured
    /// duplicate semantics. Strict mode rejects duplicates outright.
    pub fn add_or_update(
        &mut self,
        slug_or_url: &str,
        side: Side,
        price_cents: Decimal,
        notes: &str,
    ) -> Result<AddOutcome> {
        validate_price_cents(price_cents)?;
        let slug = slug_or_url.trim();
        if slug.is_empty() {
            return Err(SentinelError::InvalidCommand(
                "market slug must not be empty".to_string(),
            ));
        }

        if let Some(idx) = self.find(slug, side) {
            if self.semantics == AddSemantics::Strict {
                return Err(SentinelError::InvalidCommand(format!(
                    "position {} already exists on {} {}; edit it instead",
                    idx + 1,
                    normalize_market_slug(slug),
                    side
                )));
            }
            let old_price = self.positions[idx].limit_price_cents;
            self.positions[idx].limit_price_cents = price_cents;
            return Ok(AddOutcome::Updated { old_price });
        }

        self.positions.push(Position {
            market_slug: slug.to_string(),
            side,
            limit_price_cents: price_cents,
            notes: notes.to_string(),
        });
        Ok(AddOutcome::Added)
    }

    /// Edit the price of the position at a 1-based index
    pub fn edit_price(&mut self, index: usize, new_price: Decimal) -> Result<EditOutcome> {
        validate_price_cents(new_price)?;
        let count = self.positions.len();
        if index == 0 || index > count {
            return Err(SentinelError::InvalidCommand(format!(
                "index {} out of range; the book holds {} position(s)",
                index, count
            )));
        }
        let position = &mut self.positions[index - 1];
        let old_price = position.limit_price_cents;
        position.limit_price_cents = new_price;
        Ok(EditOutcome {
            market_slug: position.market_slug.clone(),
            side: position.side,
            old_price,
            new_price,
        })
    }

    /// Remove positions by 1-based indices. Valid indices are applied
    /// (highest first, so earlier removals cannot shift later ones) and
    /// out-of-range indices are reported; all-invalid input is an error
    /// and nothing is applied.
    pub fn remove(&mut self, indices: &[usize]) -> Result<RemoveReport> {
        let count = self.positions.len();
        let mut valid: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i >= 1 && i <= count)
            .collect();
        valid.sort_unstable();
        valid.dedup();

        let mut out_of_range: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i == 0 || i > count)
            .collect();
        out_of_range.sort_unstable();
        out_of_range.dedup();

        if valid.is_empty() {
            return Err(SentinelError::InvalidCommand(format!(
                "no valid indices; the book holds {} position(s)",
                count
            )));
        }

        let mut report = RemoveReport {
            removed: Vec::new(),
            out_of_range,
        };
        for &index in valid.iter().rev() {
            let position = self.positions.remove(index - 1);
            report.removed.push(RemovedPosition { index, position });
        }
        Ok(report)
    }

    /// Parse bulk text, one `<slug-or-url> <YES/NO> <price>` per line.
    /// Malformed lines are counted and skipped, never fatal. Bulk input
    /// always upserts, matching its long-standing behavior.
    pub fn bulk_add(&mut self, text: &str) -> BulkReport {
        let mut report = BulkReport::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                report.skipped += 1;
                continue;
            }
            let Ok(side) = Side::from_str(parts[1]) else {
                report.skipped += 1;
                continue;
            };
            let Ok(price) = Decimal::from_str(parts[2]) else {
                report.skipped += 1;
                continue;
            };
            if validate_price_cents(price).is_err() {
                report.skipped += 1;
                continue;
            }

            if let Some(idx) = self.find(parts[0], side) {
                self.positions[idx].limit_price_cents = price;
                report.updated += 1;
            } else {
                self.positions.push(Position {
                    market_slug: parts[0].to_string(),
                    side,
                    limit_price_cents: price,
                    notes: String::new(),
                });
                report.added += 1;
            }
        }

        report
    }
}
