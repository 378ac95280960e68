//! Tool System
//!
//! Extensible tool framework for agent capabilities.
//! Tools are registered at runtime and invoked by the reasoning loop. Each
//! tool takes a single free-text input (the `Action Input` line of the
//! conversation protocol) and returns text for the observation fed back to
//! the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool metadata shown to the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier (the `Action` name)
    pub name: String,

    /// Human-readable description the model uses for tool selection
    pub description: String,
}

/// Tool call request parsed from the LLM reply
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Free-text input for the tool
    pub input: String,

    /// Call ID for log correlation
    pub id: String,
}

impl ToolCall {
    /// Create a call with a fresh correlation ID
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if known)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (observation text or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's name and description
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with the given input
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let spec = tool.spec();
        self.tools.insert(spec.name, Arc::new(tool));
    }

    /// Register a boxed tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let spec = tool.spec();
        self.tools.insert(spec.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tracing::debug!(tool = %call.name, call = %call.id, "dispatching tool");
        let result = tool.execute(call).await?;
        Ok(result.with_id(call.id.clone()))
    }

    /// Get all tool specs (for system prompt generation)
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    /// Get tool names, sorted for stable prompt output
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render the tool catalog section of the system prompt
    ///
    /// One `> name: description` line per tool, the shape conversational
    /// models are commonly tuned on.
    pub fn render_catalog(&self) -> String {
        let mut specs = self.specs();
        specs.sort_by(|a, b| a.name.cmp(&b.name));

        let lines: Vec<String> = specs
            .iter()
            .map(|spec| format!("> {}: {}", spec.name, spec.description))
            .collect();
        lines.join("\n")
    }
}
