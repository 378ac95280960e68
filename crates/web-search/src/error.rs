//! Error Types for Web Search

use thiserror::Error;

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Search error types
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query was empty or whitespace
    #[error("empty search query")]
    EmptyQuery,

    /// Transport-level failure talking to the engine
    #[error("search request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Engine answered with a non-success status
    #[error("search endpoint returned HTTP {0}")]
    Status(u16),
}
