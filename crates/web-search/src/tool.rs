//! Web Search Tool
//!
//! The `search` tool registered with the agent. Wraps a `SearchEngine` and
//! formats hits into observation text the model can read.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{AgentError, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSpec};

use crate::engine::SearchEngine;

/// Number of hits forwarded to the model by default
const DEFAULT_MAX_RESULTS: usize = 5;

/// Tool exposing live web search to the agent
pub struct WebSearchTool {
    engine: Arc<dyn SearchEngine>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            engine,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Override the hit cap
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search".into(),
            description: "When you want real time data use this".into(),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.input.trim();
        if query.is_empty() {
            return Ok(ToolResult::failure("search", "Empty search query"));
        }

        let hits = self
            .engine
            .search(query, self.max_results)
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?;

        if hits.is_empty() {
            return Ok(ToolResult::success(
                "search",
                format!("No results found for: {query}"),
            ));
        }

        let formatted: Vec<String> = hits
            .iter()
            .map(|hit| format!("**{}**\n{}\nURL: {}", hit.title, hit.snippet, hit.url))
            .collect();

        Ok(ToolResult::success("search", formatted.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockSearchEngine;
    use crate::error::{Result, SearchError};
    use crate::model::SearchResult;

    struct FailingEngine;

    #[async_trait]
    impl SearchEngine for FailingEngine {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            Err(SearchError::Status(503))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    #[test]
    fn test_spec() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::new()));
        let spec = tool.spec();
        assert_eq!(spec.name, "search");
        assert_eq!(spec.description, "When you want real time data use this");
    }

    #[tokio::test]
    async fn test_formats_hits_for_the_model() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::new()));
        let call = ToolCall::new("search", "example domains");

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("**Example Domain**"));
        assert!(result.output.contains("URL: example.com"));
        assert!(result.output.contains("\n\n**IANA: Example Domains**"));
    }

    #[tokio::test]
    async fn test_empty_input_is_a_soft_failure() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::new()));
        let call = ToolCall::new("search", "   ");

        let result = tool.execute(&call).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Empty search query");
    }

    #[tokio::test]
    async fn test_no_hits_reported_as_text() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::with_results(Vec::new())));
        let call = ToolCall::new("search", "xyzzy");

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "No results found for: xyzzy");
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_as_tool_error() {
        let tool = WebSearchTool::new(Arc::new(FailingEngine));
        let call = ToolCall::new("search", "anything");

        let err = tool.execute(&call).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[tokio::test]
    async fn test_max_results_cap() {
        let tool = WebSearchTool::new(Arc::new(MockSearchEngine::new())).with_max_results(1);
        let call = ToolCall::new("search", "example");

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains("Example Domain"));
        assert!(!result.output.contains("IANA"));
    }
}
