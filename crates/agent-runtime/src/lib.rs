//! # agent-runtime
//!
//! Runtime providers for the websearch-agent system.
//!
//! ## Providers
//!
//! - **OpenRouter** (default): Hosted chat completions over the
//!   OpenAI-compatible API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenRouterProvider;
//!
//! let provider = OpenRouterProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "openrouter")]
pub use openrouter::{OPENROUTER_BASE_URL, OpenRouterConfig, OpenRouterProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentBuilder, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
