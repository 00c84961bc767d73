//! Everything that can go wrong while indexing or serving ledger events.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event parse error: {0}")]
    EventParse(String),

    /// A ciphertext handle in an event payload was neither 32-byte hex nor
    /// base64. The event is still stored, without the handle.
    #[error("Handle decode error: {0}")]
    HandleDecode(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;
