//! Error types for the dashboard

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving the dashboard
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Lookup matched nothing
    #[error("not found: {0}")]
    NotFound(String),

    /// Document store unreachable or rejected the query
    #[error("document store unavailable: {0}")]
    ConnectionFailure(String),

    /// Conversation summary request failed
    #[error("summary error: {0}")]
    Summary(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether the failure is transient and the interaction can be retried
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailure(_) | Self::Http(_))
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        Self::ConnectionFailure(err.to_string())
    }
}
