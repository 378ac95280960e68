//! websearch-agent
//!
//! One-shot conversational agent: wires the OpenRouter chat endpoint to a
//! DuckDuckGo search tool and a transient conversation buffer, asks a single
//! question, and prints the answer.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider, ToolRegistry};
use agent_runtime::OpenRouterProvider;
use web_search::{DuckDuckGoEngine, WEB_SEARCH_AGENT_PROMPT, WebSearchTool};

/// Model served by OpenRouter
const MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

/// The one question this binary asks
const QUESTION: &str = "Give me some latest news about Ai";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize LLM provider
    let provider = Arc::new(OpenRouterProvider::from_env()?);

    // Verify OpenRouter connection
    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to OpenRouter");
            if let Ok(models) = provider.list_models().await {
                tracing::info!("  {} models available", models.len());
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ OpenRouter not reachable - the run will likely fail");
            tracing::warn!("  Check OPENROUTER_API_KEY and network access");
        }
    }

    // Initialize tools
    let engine = Arc::new(DuckDuckGoEngine::new());

    let mut tools = ToolRegistry::new();
    tools.register(WebSearchTool::new(engine));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    // Build the agent
    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .system_prompt(WEB_SEARCH_AGENT_PROMPT)
        .model(MODEL)
        .handle_parsing_errors(true)
        .build()?;

    // Run the single query
    tracing::info!(question = QUESTION, "running agent");
    let answer = agent.ask(QUESTION).await?;

    println!("Agent:\n\n {answer}");

    Ok(())
}
