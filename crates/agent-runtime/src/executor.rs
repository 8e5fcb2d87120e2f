//! Agent executor for running the completion loop
//!
//! The AgentExecutor implements the loop between one agent and the
//! completion backend:
//! 1. Send the instruction, tool manifest and conversation to the backend
//! 2. Check the stop reason
//! 3. If tools were requested, run them, append their results and loop back
//! 4. If the backend answered, return the answer
//!
//! The loop is bounded by `max_iterations` backend round trips.

use agent_core::{Context, Error, Result};
use agent_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, TokenUsage, ToolCall,
};
use agent_tools::{InvocationOutcome, ToolInvocation, ToolRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

/// Event handler for agent execution events
///
/// Implement this trait to receive callbacks during a run, e.g. to show
/// tool activity while the answer is being produced.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _agent: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _agent: &str,
        _name: &str,
        _result: std::result::Result<&str, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the agent completes
    async fn on_complete(&self, _agent: &str, _result: &str) {}

    /// Called when the run fails
    async fn on_error(&self, _agent: &str, _error: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// States of the completion loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the backend to answer
    AwaitingBackend,
    /// Running the tools the backend asked for
    AwaitingToolResults,
    /// Final answer produced
    Done,
    /// Run aborted
    Failed,
}

impl LoopState {
    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::Failed)
    }
}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of backend round trips
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// Agent instruction
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gemini-2.0-flash".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.7),
        }
    }
}

/// Outcome of one completion loop
#[derive(Debug, Clone)]
pub struct CompletionResult {
    /// Final answer
    pub text: String,
    /// Tool calls made by this agent, in order, with their nested calls
    pub invocations: Vec<ToolInvocation>,
    /// Backend round trips used
    pub iterations: usize,
    /// Tokens used by this agent's own round trips
    pub usage: TokenUsage,
}

impl CompletionResult {
    /// Every invocation, including those made by delegates, depth-first
    pub fn invoked_tools(&self) -> Vec<&ToolInvocation> {
        self.invocations
            .iter()
            .flat_map(ToolInvocation::flatten)
            .collect()
    }

    /// How many times `tool` was invoked anywhere in the tree
    pub fn count_calls(&self, tool: &str) -> usize {
        self.invoked_tools()
            .iter()
            .filter(|i| i.tool == tool)
            .count()
    }

    /// Whether the answer was produced without any tool call
    pub fn is_direct(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Executes the completion loop for one agent
pub struct AgentExecutor {
    agent_name: String,
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        agent_name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            provider,
            tool_registry,
            config,
            event_handler: None,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// The executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The tools this agent may call
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Run the loop on `query`
    ///
    /// `context` is the context of the running agent: its call path must
    /// already end with this agent. Tools receive it unchanged.
    pub async fn run(&self, query: String, context: &Context) -> Result<CompletionResult> {
        let span = info_span!(
            "completion_loop",
            agent = %self.agent_name,
            depth = context.delegation_depth(),
        );
        self.run_loop(query, context).instrument(span).await
    }

    async fn run_loop(&self, query: String, context: &Context) -> Result<CompletionResult> {
        let mut state = LoopState::AwaitingBackend;
        let mut conversation = vec![Message::user(query)];
        let mut invocations = Vec::new();
        let mut usage = TokenUsage::default();
        let tools = self.tool_registry.definitions();

        for iteration in 1..=self.config.max_iterations {
            self.transition(&mut state, LoopState::AwaitingBackend);
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                tool_count = tools.len(),
                "Sending request to completion backend"
            );

            let mut request = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                request = request.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                request = request.temperature(temperature);
            }

            let response = match self.provider.complete(request.build()).await {
                Ok(response) => response,
                Err(e) => return Err(self.fail(&mut state, e.into()).await),
            };
            usage.add(response.usage);

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Backend response received"
            );

            match response.stop_reason {
                StopReason::EndTurn | StopReason::StopSequence | StopReason::MaxTokens => {
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!("Backend response truncated by the token limit; using it as final");
                    }
                    let text = response.message.text().unwrap_or_default();
                    if text.trim().is_empty() {
                        let err = Error::Backend("Backend returned an empty final answer".to_string());
                        return Err(self.fail(&mut state, err).await);
                    }
                    self.transition(&mut state, LoopState::Done);
                    info!(iteration, response_length = text.len(), "Agent completed");

                    if let Some(handler) = &self.event_handler {
                        handler.on_complete(&self.agent_name, &text).await;
                    }
                    return Ok(CompletionResult {
                        text,
                        invocations,
                        iterations: iteration,
                        usage,
                    });
                }

                StopReason::ToolUse => {
                    let calls = response.message.tool_calls();
                    if calls.is_empty() {
                        let err = Error::Backend(
                            "Backend requested tool use without any tool call".to_string(),
                        );
                        return Err(self.fail(&mut state, err).await);
                    }

                    self.transition(&mut state, LoopState::AwaitingToolResults);
                    info!(tool_count = calls.len(), "Agent requested tool use");

                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        match self.execute_tool(&call, context).await {
                            Ok((block, invocation)) => {
                                results.push(block);
                                invocations.push(invocation);
                            }
                            Err(e) => return Err(self.fail(&mut state, e).await),
                        }
                    }

                    conversation.push(response.message);
                    conversation.push(Message::tool_results(results));
                }
            }
        }

        let err = Error::CompletionBudgetExceeded {
            agent: self.agent_name.clone(),
            max_iterations: self.config.max_iterations,
        };
        Err(self.fail(&mut state, err).await)
    }

    /// Run one tool call
    ///
    /// Ordinary tool failures become error results for the backend;
    /// request-fatal ones are returned as `Err`.
    async fn execute_tool(
        &self,
        call: &ToolCall,
        context: &Context,
    ) -> Result<(ContentBlock, ToolInvocation)> {
        let Some(tool) = self.tool_registry.get(&call.name) else {
            warn!(tool_name = %call.name, "Backend requested an undeclared tool");
            return Err(Error::UnknownTool {
                agent: self.agent_name.clone(),
                tool: call.name.clone(),
            });
        };

        let input_preview: String = call.input.to_string().chars().take(300).collect();
        info!(
            tool_name = %call.name,
            tool_id = %call.id,
            input_preview = %input_preview,
            "Executing tool"
        );
        if let Some(handler) = &self.event_handler {
            handler
                .on_tool_start(&self.agent_name, &call.name, &call.input)
                .await;
        }

        let started = Instant::now();
        let outcome = tool.execute(call.input.clone(), context).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                let text = output.text();
                info!(
                    tool_name = %call.name,
                    duration_ms,
                    result_length = text.len(),
                    "Tool execution succeeded"
                );
                if let Some(handler) = &self.event_handler {
                    handler
                        .on_tool_done(&self.agent_name, &call.name, Ok(&text), duration_ms)
                        .await;
                }

                let invocation = ToolInvocation {
                    tool: call.name.clone(),
                    kind: tool.kind(),
                    arguments: call.input.clone(),
                    outcome: InvocationOutcome::Success {
                        content: text.clone(),
                    },
                    duration_ms,
                    nested: output.trace,
                };
                Ok((
                    ContentBlock::tool_result(&call.id, &call.name, text),
                    invocation,
                ))
            }
            Err(e) if e.is_request_fatal() => {
                warn!(tool_name = %call.name, error = %e, "Tool failed; aborting request");
                Err(e)
            }
            Err(e) => {
                let error = e.to_string();
                warn!(tool_name = %call.name, duration_ms, error = %error, "Tool execution failed");
                if let Some(handler) = &self.event_handler {
                    handler
                        .on_tool_done(&self.agent_name, &call.name, Err(&error), duration_ms)
                        .await;
                }

                let invocation = ToolInvocation {
                    tool: call.name.clone(),
                    kind: tool.kind(),
                    arguments: call.input.clone(),
                    outcome: InvocationOutcome::Failure {
                        error: error.clone(),
                    },
                    duration_ms,
                    nested: Vec::new(),
                };
                Ok((
                    ContentBlock::tool_error(&call.id, &call.name, format!("Error: {error}")),
                    invocation,
                ))
            }
        }
    }

    fn transition(&self, state: &mut LoopState, next: LoopState) {
        if *state != next {
            debug!(from = ?*state, to = ?next, "Completion loop state change");
            *state = next;
        }
    }

    async fn fail(&self, state: &mut LoopState, error: Error) -> Error {
        self.transition(state, LoopState::Failed);
        warn!(error = %error, "Completion loop failed");
        if let Some(handler) = &self.event_handler {
            handler.on_error(&self.agent_name, &error.to_string()).await;
        }
        error
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    agent_name: String,
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            agent_name: "agent".to_string(),
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Name of the agent running the loop
    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    /// Set the completion backend
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the agent instruction
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Configuration("Provider not set".to_string()))?;
        if self.config.max_iterations == 0 {
            return Err(Error::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let executor = AgentExecutor::new(
            self.agent_name,
            provider,
            self.tool_registry,
            self.config,
        );
        Ok(match self.event_handler {
            Some(handler) => executor.with_event_handler(handler),
            None => executor,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
