//! # web-search
//!
//! Web search for the conversational agent: a `SearchEngine` abstraction
//! with a DuckDuckGo implementation, and the `search` tool the agent
//! registers.
//!
//! The DuckDuckGo engine scrapes the keyless HTML endpoint, so no search API
//! credentials are needed. Swap in another backend by implementing
//! `SearchEngine`.

pub mod engine;
pub mod error;
pub mod model;
pub mod tool;

pub use engine::{DuckDuckGoEngine, MockSearchEngine, SearchEngine};
pub use error::{Result, SearchError};
pub use model::SearchResult;
pub use tool::WebSearchTool;

/// System prompt for the web-search agent
pub const WEB_SEARCH_AGENT_PROMPT: &str = r"You are a helpful conversational assistant with access to live web search.

Questions about current events, recent developments, or anything that may
have changed since your training data should be answered with the search
tool rather than from memory. Summarize what the search returns, name the
sources when they matter, and say so when the results are inconclusive.

For questions that need no fresh data, answer directly.";
