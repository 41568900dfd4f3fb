//! Error types for the LP sentinel

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Errors produced by the sentinel
#[derive(Debug, Error)]
pub enum SentinelError {
    /// HTTP transport failure (Gamma, CLOB, Data API, Telegram)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected API response shape or status
    #[error("API error: {0}")]
    Api(String),

    /// Market lookup returned nothing
    #[error("Market not found: {0}")]
    MarketNotFound(String),

    /// Rejected position-management command (bad index, bad price, duplicate)
    #[error("{0}")]
    InvalidCommand(String),

    /// Position store I/O failure
    #[error("Position store error: {0}")]
    Store(String),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
