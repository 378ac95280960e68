//! Reasoning Loop
//!
//! Implements the conversational ReAct (Reason + Act) pattern. The model
//! speaks a line-oriented protocol: it either requests a tool with
//! `Action:` / `Action Input:` lines and receives the output back on an
//! `Observation:` line, or it hands back a final answer after the `AI:`
//! marker. The loop drives that cycle over a shared conversation buffer.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{FinishReason, GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry, ToolResult};

/// Marker the model uses to hand back a final answer
const FINAL_ANSWER_PREFIX: &str = "AI:";

/// Marker opening a tool request
const ACTION_PREFIX: &str = "Action:";

/// Marker carrying the tool input
const ACTION_INPUT_PREFIX: &str = "Action Input:";

/// Stop sequence keeping the model from inventing tool output
const OBSERVATION_STOP: &str = "\nObservation:";

const DEFAULT_SYSTEM_PROMPT: &str = r"You are a helpful AI assistant.

Use a tool when it gives a better answer than memory, otherwise answer
directly. Be concise and accurate.";

/// Protocol section appended to the system prompt when tools are registered
const FORMAT_INSTRUCTIONS: &str = r"TOOLS
-----
You have access to the following tools:

{tools}

To use a tool, reply in exactly this format:

Thought: Do I need to use a tool? Yes
Action: the tool to use, one of [{tool_names}]
Action Input: the input to the tool

The tool output comes back to you on an Observation line. When you have
enough to answer, or when no tool is needed, reply in exactly this format:

Thought: Do I need to use a tool? No
AI: your reply to the user";

/// Observation sent back when the reply fits neither protocol shape
const PARSE_RETRY_NOTE: &str = "Invalid format. To use a tool, reply with `Action:` and \
`Action Input:` lines. To answer, reply with a line starting with `AI:`.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append the tool catalog and protocol to the system prompt
    pub inject_tool_catalog: bool,

    /// Feed unparseable replies back as observations instead of failing
    pub handle_parsing_errors: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_catalog: true,
            handle_parsing_errors: false,
        }
    }
}

/// One parsed model reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentStep {
    /// The model requested a tool
    Act {
        /// Tool name from the `Action:` line
        tool: String,
        /// Input from the `Action Input:` line
        input: String,
    },

    /// The model produced its final answer
    Finish(String),
}

/// Parse a model reply into a step.
///
/// A final-answer marker wins over action lines, and the answer is everything
/// after the last marker. Otherwise an `Action:` line paired with
/// `Action Input:` names a tool call. Anything else is a parse error.
fn parse_step(reply: &str) -> Result<AgentStep> {
    let text = strip_code_fences(reply);
    // Models that ignore the stop sequence hallucinate observations; cut them off
    let text = text
        .split_once(OBSERVATION_STOP)
        .map_or(text, |(head, _)| head);

    if let Some(answer) = find_final_answer(text) {
        return Ok(AgentStep::Finish(answer));
    }

    if let Some((tool, input)) = parse_action(text) {
        return Ok(AgentStep::Act { tool, input });
    }

    Err(AgentError::Parse(format!(
        "could not parse reply: {}",
        truncate_for_log(text)
    )))
}

/// Find the last line-anchored final-answer marker and return what follows it
fn find_final_answer(text: &str) -> Option<String> {
    text.match_indices(FINAL_ANSWER_PREFIX)
        .filter(|(idx, _)| starts_line(text, *idx))
        .last()
        .map(|(idx, _)| text[idx + FINAL_ANSWER_PREFIX.len()..].trim().to_string())
}

/// Parse `Action:` / `Action Input:` lines into (tool, input)
fn parse_action(text: &str) -> Option<(String, String)> {
    let action_idx = find_line_marker(text, ACTION_PREFIX)?;
    let after = &text[action_idx + ACTION_PREFIX.len()..];
    let input_idx = after.find(ACTION_INPUT_PREFIX)?;

    let tool = after[..input_idx].trim();
    if tool.is_empty() || tool.contains('\n') {
        return None;
    }

    // Keep line breaks inside the input, strip surrounding quotes
    let input = after[input_idx + ACTION_INPUT_PREFIX.len()..]
        .trim()
        .trim_matches('"');

    Some((tool.to_string(), input.to_string()))
}

/// Index of the first `marker` occurrence that starts a line
fn find_line_marker(text: &str, marker: &str) -> Option<usize> {
    text.match_indices(marker)
        .find(|(idx, _)| starts_line(text, *idx))
        .map(|(idx, _)| idx)
}

/// True when only whitespace sits between `idx` and the start of its line
fn starts_line(text: &str, idx: usize) -> bool {
    text[..idx]
        .chars()
        .rev()
        .take_while(|c| *c != '\n')
        .all(char::is_whitespace)
}

/// Drop a surrounding markdown fence if the model wrapped its reply in one
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Clip reply text for error messages
fn truncate_for_log(text: &str) -> &str {
    text.char_indices()
        .nth(200)
        .map_or(text, |(idx, _)| &text[..idx])
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Build the full system prompt including the tool catalog
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_catalog && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(
                &FORMAT_INSTRUCTIONS
                    .replace("{tools}", &self.tools.render_catalog())
                    .replace("{tool_names}", &self.tools.names().join(", ")),
            );
        }

        prompt
    }

    /// Run the agent over a conversation until it produces a final answer
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        // Ensure system prompt is set
        if conversation.messages().first().map(|m| m.role) != Some(Role::System) {
            let messages = conversation.messages_mut();
            messages.insert(0, Message::system(self.build_system_prompt()));
        }

        let mut options = self.config.generation.clone();
        if !options.stop_sequences.iter().any(|s| s == OBSERVATION_STOP) {
            options.stop_sequences.push(OBSERVATION_STOP.into());
        }

        for iteration in 1..=self.config.max_iterations {
            conversation.truncate_to_fit();

            let completion = self
                .provider
                .complete(conversation.messages(), &options)
                .await?;

            if completion.finish_reason == Some(FinishReason::Length) {
                tracing::warn!(iteration, "completion cut off by token limit");
            }
            if let Some(usage) = completion.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "token usage"
                );
            }

            match parse_step(&completion.content) {
                Ok(AgentStep::Finish(answer)) => {
                    tracing::info!(iteration, "final answer ready");
                    conversation.push(Message::assistant(&answer));
                    return Ok(answer);
                }
                Ok(AgentStep::Act { tool, input }) => {
                    let call = ToolCall::new(tool, input);
                    tracing::info!(iteration, tool = %call.name, input = %call.input, "tool requested");
                    conversation.push(Message::assistant(&completion.content));

                    let result = self.execute_tool(&call).await;
                    tracing::info!(tool = %result.name, success = result.success, "observation recorded");
                    conversation.push(Message::observation(format!(
                        "Observation: {}",
                        result.output
                    )));
                }
                Err(parse_err) => {
                    if !self.config.handle_parsing_errors {
                        return Err(parse_err);
                    }
                    tracing::warn!(iteration, error = %parse_err, "unparseable reply, asking the model to retry");
                    conversation.push(Message::assistant(&completion.content));
                    conversation.push(Message::observation(format!(
                        "Observation: {PARSE_RETRY_NOTE}"
                    )));
                }
            }
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Execute a tool call, converting failures into observations for the model
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(result) => result,
            Err(AgentError::ToolNotFound(name)) => {
                let msg = format!(
                    "'{}' is not a valid tool, try one of [{}].",
                    name,
                    self.tools.names().join(", ")
                );
                ToolResult::failure(name, msg).with_id(call.id.clone())
            }
            Err(e) => {
                ToolResult::failure(&call.name, format!("Error: {e}")).with_id(call.id.clone())
            }
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn handle_parsing_errors(mut self, enabled: bool) -> Self {
        self.config.handle_parsing_errors = enabled;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, ModelInfo};
    use crate::tool::{Tool, ToolSpec};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            Ok(Completion {
                content,
                model: "scripted".into(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            })
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".into(),
                description: "Echoes the input".into(),
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", format!("echo: {}", call.input)))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "flaky".into(),
                description: "Always fails".into(),
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
            Err(AgentError::ToolExecution("backend exploded".into()))
        }
    }

    fn scripted_agent(replies: &[&str]) -> AgentBuilder {
        AgentBuilder::new()
            .provider(Arc::new(ScriptedProvider::new(replies)))
            .tool(EchoTool)
    }

    #[test]
    fn test_parse_final_answer() {
        let step = parse_step("Thought: Do I need to use a tool? No\nAI: Paris is the capital.");
        assert_eq!(
            step.unwrap(),
            AgentStep::Finish("Paris is the capital.".into())
        );
    }

    #[test]
    fn test_parse_final_answer_wins_over_action() {
        let step = parse_step("Action: echo\nAction Input: hi\nAI: done anyway");
        assert_eq!(step.unwrap(), AgentStep::Finish("done anyway".into()));
    }

    #[test]
    fn test_parse_answer_after_last_marker() {
        let step = parse_step("AI: first try\nAI: final version");
        assert_eq!(step.unwrap(), AgentStep::Finish("final version".into()));
    }

    #[test]
    fn test_parse_marker_must_start_a_line() {
        let err = parse_step("Powered by OpenAI: the answer is 4.").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_parse_action() {
        let step = parse_step(
            "Thought: Do I need to use a tool? Yes\nAction: search\nAction Input: latest AI news",
        );
        assert_eq!(
            step.unwrap(),
            AgentStep::Act {
                tool: "search".into(),
                input: "latest AI news".into()
            }
        );
    }

    #[test]
    fn test_parse_action_strips_quotes() {
        let step = parse_step("Action: search\nAction Input: \"latest AI news\"");
        assert_eq!(
            step.unwrap(),
            AgentStep::Act {
                tool: "search".into(),
                input: "latest AI news".into()
            }
        );
    }

    #[test]
    fn test_parse_action_keeps_multiline_input() {
        let step = parse_step("Action: echo\nAction Input: line one\nline two");
        assert_eq!(
            step.unwrap(),
            AgentStep::Act {
                tool: "echo".into(),
                input: "line one\nline two".into()
            }
        );
    }

    #[test]
    fn test_parse_fenced_reply() {
        let step = parse_step("```\nThought: Do I need to use a tool? No\nAI: fenced answer\n```");
        assert_eq!(step.unwrap(), AgentStep::Finish("fenced answer".into()));
    }

    #[test]
    fn test_parse_hallucinated_observation_is_cut() {
        let step = parse_step("Action: echo\nAction Input: hi\nObservation: fake result");
        assert_eq!(
            step.unwrap(),
            AgentStep::Act {
                tool: "echo".into(),
                input: "hi".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_step("The weather is nice today.").unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[test]
    fn test_builder_requires_provider() {
        let result = AgentBuilder::new().build();
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_builder_applies_options() {
        let agent = scripted_agent(&[])
            .temperature(0.2)
            .max_iterations(3)
            .build()
            .unwrap();

        assert_eq!(agent.config().generation.temperature, 0.2);
        assert_eq!(agent.config().max_iterations, 3);
        assert_eq!(agent.tools().names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let agent = scripted_agent(&["Thought: Do I need to use a tool? No\nAI: Paris"])
            .build()
            .unwrap();

        let answer = agent.ask("Capital of France?").await.unwrap();
        assert_eq!(answer, "Paris");
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let agent = scripted_agent(&[
            "Thought: Do I need to use a tool? Yes\nAction: echo\nAction Input: hello",
            "Thought: Do I need to use a tool? No\nAI: the tool said hello",
        ])
        .build()
        .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("say hello"));
        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "the tool said hello");
        assert_eq!(conversation.messages()[0].role, Role::System);

        let observation = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("observation recorded");
        assert!(observation.content.contains("echo: hello"));
    }

    #[tokio::test]
    async fn test_unknown_tool_feeds_error_back() {
        let agent = scripted_agent(&[
            "Thought: Do I need to use a tool? Yes\nAction: frobnicate\nAction Input: x",
            "Thought: Do I need to use a tool? No\nAI: sorry, no such tool",
        ])
        .build()
        .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("frob it"));
        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "sorry, no such tool");

        let observation = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(observation.content.contains("not a valid tool"));
        assert!(observation.content.contains("echo"));
    }

    #[tokio::test]
    async fn test_tool_failure_feeds_error_back() {
        let agent = scripted_agent(&[
            "Thought: Do I need to use a tool? Yes\nAction: flaky\nAction Input: x",
            "Thought: Do I need to use a tool? No\nAI: the tool is down",
        ])
        .tool(FailingTool)
        .build()
        .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("try the flaky one"));
        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "the tool is down");

        let observation = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(observation.content.starts_with("Observation: Error:"));
        assert!(observation.content.contains("backend exploded"));
    }

    #[tokio::test]
    async fn test_parse_error_recovery() {
        let agent = scripted_agent(&[
            "Let me think about this out loud instead.",
            "Thought: Do I need to use a tool? No\nAI: recovered",
        ])
        .handle_parsing_errors(true)
        .build()
        .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("hi"));
        let answer = agent.run(&mut conversation).await.unwrap();

        assert_eq!(answer, "recovered");

        let observation = conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(observation.content.contains("Invalid format"));
    }

    #[tokio::test]
    async fn test_parse_error_without_recovery_fails() {
        let agent = scripted_agent(&["rambling with no protocol"]).build().unwrap();

        let err = agent.ask("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Parse(_)));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let agent = scripted_agent(&[
            "Action: echo\nAction Input: one",
            "Action: echo\nAction Input: two",
        ])
        .max_iterations(2)
        .build()
        .unwrap();

        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
    }

    #[tokio::test]
    async fn test_system_prompt_lists_tools() {
        let agent = scripted_agent(&["AI: ok"])
            .system_prompt("You are a test harness.")
            .build()
            .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("hi"));
        agent.run(&mut conversation).await.unwrap();

        let system = &conversation.messages()[0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.starts_with("You are a test harness."));
        assert!(system.content.contains("> echo: Echoes the input"));
        assert!(system.content.contains("one of [echo]"));
    }
}
