//! Configuration loading
//!
//! Settings come from `config.toml` with environment overrides
//! (prefix `LP_SENTINEL_`, `__` as section separator). Every section
//! is optional; defaults match the public Polymarket endpoints and the
//! monitor's shipped tuning.

use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub polymarket: PolymarketConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    pub telegram: Option<TelegramConfig>,
}

impl Config {
    /// Load configuration from a TOML file plus environment overrides.
    /// A missing file yields the built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("LP_SENTINEL")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            polymarket: PolymarketConfig::default(),
            scan: ScanConfig::default(),
            monitor: MonitorConfig::default(),
            telegram: None,
        }
    }
}

/// Polymarket API endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    #[serde(default = "default_data_api_url")]
    pub data_api_url: String,
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
            data_api_url: default_data_api_url(),
        }
    }
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_data_api_url() -> String {
    "https://data-api.polymarket.com".to_string()
}

/// Scanner tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Composite risk cutoff for the low-risk list (0-100)
    #[serde(default = "default_max_risk")]
    pub max_risk: Decimal,
    /// How many ranked markets to display
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Minimum lifetime volume in USD
    #[serde(default = "default_min_volume")]
    pub min_volume: Decimal,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_risk: default_max_risk(),
            top_n: default_top_n(),
            min_volume: default_min_volume(),
        }
    }
}

fn default_max_risk() -> Decimal {
    dec!(35)
}

fn default_top_n() -> usize {
    25
}

fn default_min_volume() -> Decimal {
    dec!(25000)
}

/// Duplicate-position policy for add operations.
///
/// The monitor has shipped both behaviors at different times, so the
/// choice is explicit configuration rather than a hardcoded guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddSemantics {
    /// Adding an existing (market, side) replaces its price
    Upsert,
    /// Adding an existing (market, side) is rejected; edit instead
    Strict,
}

impl Default for AddSemantics {
    fn default() -> Self {
        AddSemantics::Upsert
    }
}

/// Position monitor tuning
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Alert when distance-to-limit drops below this many cents
    #[serde(default = "default_alert_threshold_cents")]
    pub alert_threshold_cents: Decimal,
    #[serde(default = "default_positions_path")]
    pub positions_path: String,
    #[serde(default)]
    pub add_semantics: AddSemantics,
}

impl MonitorConfig {
    /// Positions path with `~` expanded
    pub fn expanded_positions_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.positions_path).into_owned())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            alert_threshold_cents: default_alert_threshold_cents(),
            positions_path: default_positions_path(),
            add_semantics: AddSemantics::default(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_alert_threshold_cents() -> Decimal {
    dec!(1.0)
}

fn default_positions_path() -> String {
    "positions.json".to_string()
}

/// Telegram bot credentials and notification switches
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub notify_errors: bool,
}

fn default_true() -> bool {
    true
}
