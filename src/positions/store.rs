//! Flat-JSON position persistence
//!
//! The store is a pretty-printed JSON array. Saves go through a
//! temporary sibling file and a rename, so a failed write never
//! truncates the existing store.

use super::{validate_price_cents, Position};
use crate::error::{Result, SentinelError};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Load positions; a missing file is an empty book. Entries that fail
/// to parse or carry an out-of-bounds price are skipped with a warning
/// rather than poisoning the whole book.
pub fn load(path: &Path) -> Result<Vec<Position>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| SentinelError::Store(format!("read {}: {}", path.display(), e)))?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| SentinelError::Store(format!("parse {}: {}", path.display(), e)))?;

    let mut positions = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Position>(entry) {
            Ok(position) => {
                if validate_price_cents(position.limit_price_cents).is_err() {
                    warn!(
                        "Skipping stored position on {} with out-of-bounds price {}",
                        position.market_slug, position.limit_price_cents
                    );
                    continue;
                }
                positions.push(position);
            }
            Err(e) => {
                warn!("Skipping malformed position entry: {}", e);
            }
        }
    }

    Ok(positions)
}

/// Persist the full ordered book, all-or-nothing
pub fn save(path: &Path, positions: &[Position]) -> Result<()> {
    let json = serde_json::to_string_pretty(positions)?;

    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");

    fs::write(&tmp, json)
        .map_err(|e| SentinelError::Store(format!("write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| SentinelError::Store(format!("rename {}: {}", path.display(), e)))?;

    Ok(())
}
