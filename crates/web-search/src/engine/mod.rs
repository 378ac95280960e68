//! Search Engine Integration
//!
//! Abstractions and implementations for web search backends.

mod duckduckgo;
mod mock;

pub use duckduckgo::DuckDuckGoEngine;
pub use mock::MockSearchEngine;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SearchResult;

/// Search engine trait (Strategy pattern)
///
/// Implement this for each backend: DuckDuckGo, Brave, SearXNG, etc.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run a query and return up to `max_results` hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Check if the engine is reachable
    async fn health_check(&self) -> bool;

    /// Engine name
    fn name(&self) -> &str;
}
