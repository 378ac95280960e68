//! DuckDuckGo Search Engine
//!
//! Scrapes the HTML endpoint (`html.duckduckgo.com`), which needs no API key.
//! Extraction is positional string work over the result markup; if the markup
//! drifts, queries degrade to fewer (or zero) hits rather than errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;

use super::SearchEngine;
use crate::error::{Result, SearchError};
use crate::model::SearchResult;

/// HTML (non-JS) search endpoint
const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Browser-style agent string; the endpoint rejects obvious bots
const USER_AGENT: &str = "Mozilla/5.0 (compatible; websearch-agent/0.1)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// DuckDuckGo web search over the HTML endpoint
pub struct DuckDuckGoEngine {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DuckDuckGoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoEngine {
    pub fn new() -> Self {
        Self::with_base_url(DUCKDUCKGO_HTML_URL)
    }

    /// Point at a different instance (e.g. a self-hosted mirror)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoEngine {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let response = self
            .client
            .get(&self.base_url)
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[("q", query)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        let results = extract_results(&html, max_results);
        tracing::debug!(query, hits = results.len(), "duckduckgo search");

        Ok(results)
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(&self.base_url)
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    fn name(&self) -> &str {
        "DuckDuckGo"
    }
}

/// Extract hits from the result markup.
///
/// Each hit sits in a `result__body` block holding anchor, snippet and URL
/// spans. Blocks without a title (ads, spacers) are skipped.
fn extract_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    // The body div lists layout classes too; `result__body` is the last token
    // in its class attribute.
    for chunk in html.split("result__body\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let title = segment(chunk, "class=\"result__a\"")
            .map(clean_fragment)
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }

        let url = segment(chunk, "class=\"result__url\"")
            .map(clean_fragment)
            .unwrap_or_default();
        let snippet = segment(chunk, "class=\"result__snippet\"")
            .map(clean_fragment)
            .unwrap_or_default();

        results.push(SearchResult::new(title, url, snippet));
    }

    results
}

/// Anchor text between the tag carrying `marker` and its closing `</a>`
fn segment<'a>(chunk: &'a str, marker: &str) -> Option<&'a str> {
    let after_marker = chunk.split(marker).nth(1)?;
    let (_, after_tag) = after_marker.split_once('>')?;
    let end = after_tag.find("</a>")?;
    Some(&after_tag[..end])
}

/// Strip inner tags, decode entities, collapse whitespace
fn clean_fragment(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;

    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    html_decode(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the entities the result markup actually uses
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
