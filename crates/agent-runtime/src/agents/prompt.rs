//! Instruction-driven agent
//!
//! A `PromptAgent` is an immutable bundle of name, description, model,
//! instruction and tools. Running it enters its name on the context's call
//! path and drives the completion loop.

use crate::executor::{AgentExecutor, CompletionResult, ExecutorConfig, ExecutorEventHandler};
use agent_core::{Agent, Context, Error, Result};
use agent_llm::LLMProvider;
use agent_tools::{Tool, ToolRegistry, validate_identifier};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// An agent built from an instruction, a model and a tool set
pub struct PromptAgent {
    name: String,
    description: String,
    executor: AgentExecutor,
}

impl PromptAgent {
    /// Create a builder
    pub fn builder(provider: Arc<dyn LLMProvider>) -> PromptAgentBuilder {
        PromptAgentBuilder::new(provider)
    }

    /// Model identifier used for completions
    pub fn model(&self) -> &str {
        &self.executor.config().model
    }

    /// Instruction sent with every completion
    pub fn instruction(&self) -> &str {
        self.executor.config().system_prompt.as_deref().unwrap_or_default()
    }

    /// Tools this agent may call
    pub fn tools(&self) -> &ToolRegistry {
        self.executor.tools()
    }

    /// Backend round trips allowed per run
    pub fn max_iterations(&self) -> usize {
        self.executor.config().max_iterations
    }

    /// Run the completion loop on `query`
    ///
    /// `context` is the caller's context; the agent runs in a child context
    /// with its own name appended to the call path.
    pub async fn run(&self, query: impl Into<String>, context: &Context) -> Result<CompletionResult> {
        let own = context.enter(&self.name);
        debug!(agent = %self.name, path = ?own.call_path(), "Running agent");
        self.executor.run(query.into(), &own).await
    }
}

#[async_trait]
impl Agent for PromptAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        self.run(input, context).await.map(|result| result.text)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for PromptAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptAgent")
            .field("name", &self.name)
            .field("model", &self.model())
            .field("tools", self.tools())
            .finish_non_exhaustive()
    }
}

/// Builder for PromptAgent
///
/// `build` performs every construction-time check: identifier syntax,
/// model support, tool set validity, and self-delegation.
pub struct PromptAgentBuilder {
    provider: Arc<dyn LLMProvider>,
    name: String,
    description: String,
    tools: Vec<Arc<dyn Tool>>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl PromptAgentBuilder {
    /// Create a builder using `provider` as completion backend
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            name: String::new(),
            description: String::new(),
            tools: Vec::new(),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the agent name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description (default description when wrapped as a tool)
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the instruction
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.system_prompt = Some(instruction.into());
        self
    }

    /// Add one tool
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add several tools, in order
    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set maximum backend round trips per run
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<PromptAgent> {
        validate_identifier("Agent", &self.name)?;

        let model = self.config.model.trim();
        if model.is_empty() || !self.provider.supports_model(model) {
            return Err(Error::Configuration(format!(
                "Agent '{}': model '{}' is not supported by the '{}' backend",
                self.name,
                self.config.model,
                self.provider.name()
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(Error::Configuration(format!(
                "Agent '{}': max_iterations must be at least 1",
                self.name
            )));
        }

        let registry = ToolRegistry::from_tools(self.tools)
            .map_err(|e| Error::Configuration(format!("Agent '{}': {e}", self.name)))?;

        if registry.reachable_agents().iter().any(|a| *a == self.name) {
            return Err(Error::Configuration(format!(
                "Agent '{}' would delegate back to itself through its tools",
                self.name
            )));
        }

        let mut executor = AgentExecutor::builder()
            .agent_name(self.name.clone())
            .provider(self.provider)
            .tool_registry(Arc::new(registry))
            .config(self.config);
        if let Some(handler) = self.event_handler {
            executor = executor.event_handler(handler);
        }
        let executor = executor.build()?;

        Ok(PromptAgent {
            name: self.name,
            description: self.description,
            executor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::ScriptedProvider;
    use agent_tools::FunctionTool;

    fn provider() -> Arc<dyn LLMProvider> {
        Arc::new(ScriptedProvider::replying("ok").with_supported_models(&["gemini-2.0-flash"]))
    }

    fn docs_tool() -> Arc<dyn Tool> {
        Arc::new(FunctionTool::text("retrieve_docs", "Recherche", "query", |q, _| async move {
            Ok(q)
        }))
    }

    #[test]
    fn test_build_agent() {
        let agent = PromptAgent::builder(provider())
            .name("search_agent")
            .description("Recherche d'informations")
            .model("gemini-2.0-flash")
            .instruction("Tu es un agent de recherche")
            .tool(docs_tool())
            .build()
            .unwrap();

        assert_eq!(agent.name(), "search_agent");
        assert_eq!(agent.description(), "Recherche d'informations");
        assert_eq!(agent.model(), "gemini-2.0-flash");
        assert_eq!(agent.instruction(), "Tu es un agent de recherche");
        assert_eq!(agent.tools().names(), ["retrieve_docs"]);
    }

    #[test]
    fn test_rejects_bad_definitions() {
        let empty_name = PromptAgent::builder(provider()).build();
        assert!(matches!(empty_name, Err(Error::Configuration(_))));

        let bad_model = PromptAgent::builder(provider())
            .name("search_agent")
            .model("gpt-unknown")
            .build();
        assert!(matches!(bad_model, Err(Error::Configuration(ref m)) if m.contains("gpt-unknown")));

        let duplicate_tools = PromptAgent::builder(provider())
            .name("search_agent")
            .tools([docs_tool(), docs_tool()])
            .build();
        assert!(matches!(duplicate_tools, Err(Error::Configuration(ref m)) if m.contains("search_agent")));
    }

    #[tokio::test]
    async fn test_event_handler_reaches_the_loop() {
        use crate::executor::ExecutorEventHandler;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Completions(Mutex<Vec<String>>);

        #[async_trait]
        impl ExecutorEventHandler for Completions {
            async fn on_complete(&self, agent: &str, result: &str) {
                self.0.lock().unwrap().push(format!("{agent}: {result}"));
            }
        }

        let handler = Arc::new(Completions::default());
        let agent = PromptAgent::builder(provider())
            .name("planning_agent")
            .event_handler(handler.clone())
            .build()
            .unwrap();

        agent.run("Organise ma semaine", &Context::new()).await.unwrap();
        assert_eq!(*handler.0.lock().unwrap(), ["planning_agent: ok"]);
    }

    #[tokio::test]
    async fn test_run_enters_call_path() {
        let agent = PromptAgent::builder(provider())
            .name("pedagogical_agent")
            .build()
            .unwrap();

        let mut ctx = Context::new().with_grade("5e");
        let text = agent.process("Explique les fractions".into(), &mut ctx).await.unwrap();
        assert_eq!(text, "ok");
        // The caller's context is not modified
        assert!(ctx.call_path().is_empty());
    }
}
