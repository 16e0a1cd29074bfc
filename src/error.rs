/// Result type for collaborator operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Error types for persistence, delivery and publishing
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Atomic write failed: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Store sync error: {0}")]
    Store(String),

    #[error("Publish error: {0}")]
    Publish(String),
}
