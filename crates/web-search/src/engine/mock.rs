//! Mock Search Engine
//!
//! Canned results for tests and offline runs.

use async_trait::async_trait;

use super::SearchEngine;
use crate::error::{Result, SearchError};
use crate::model::SearchResult;

/// Mock engine answering every query with the same results
pub struct MockSearchEngine {
    results: Vec<SearchResult>,
}

impl Default for MockSearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchEngine {
    /// Engine with a small canned result set
    pub fn new() -> Self {
        Self {
            results: vec![
                SearchResult::new(
                    "Example Domain",
                    "example.com",
                    "This domain is for use in illustrative examples in documents.",
                ),
                SearchResult::new(
                    "IANA: Example Domains",
                    "iana.org/domains/example",
                    "Reserved domains maintained for documentation purposes.",
                ),
            ],
        }
    }

    /// Engine with caller-provided results
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "MockSearch"
    }
}
