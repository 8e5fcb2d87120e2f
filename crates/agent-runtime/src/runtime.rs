//! Agent registry and factory
//!
//! The AgentRuntime owns the completion backend and every agent built for
//! the process. Agents are registered once at startup and then only read;
//! delegation wrappers hold weak references into this registry.

use crate::agents::{AgentTool, PromptAgent, PromptAgentBuilder};
use agent_core::{Agent, Error, Result};
use agent_llm::LLMProvider;
use agent_tools::Tool;
use std::sync::Arc;
use tracing::info;

/// Configuration for the agent runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model used when an agent does not name one
    pub default_model: String,

    /// Backend round trips allowed per agent run
    pub default_max_iterations: usize,

    /// Max tokens per completion
    pub default_max_tokens: usize,

    /// Sampling temperature
    pub default_temperature: Option<f32>,

    /// Bound on nested delegation hops
    pub max_delegation_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.0-flash".to_string(),
            default_max_iterations: 10,
            default_max_tokens: 4096,
            default_temperature: Some(0.7),
            max_delegation_depth: crate::agents::delegation::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Owner of the completion backend and the agent registry
///
/// # Example
///
/// ```
/// use agent_llm::testing::ScriptedProvider;
/// use agent_runtime::AgentRuntime;
/// use std::sync::Arc;
///
/// # fn main() -> agent_core::Result<()> {
/// let mut runtime = AgentRuntime::builder()
///     .provider(Arc::new(ScriptedProvider::replying("Bonjour !")))
///     .build()?;
///
/// let search = runtime.build_agent("search_agent", "gemini-2.0-flash", "Cherche", vec![])?;
/// let tool = runtime.wrap_as_tool(&search);
/// let orchestrator = runtime.build_agent(
///     "orchestrator_agent",
///     "gemini-2.0-flash",
///     "Délègue",
///     vec![Arc::new(tool)],
/// )?;
///
/// assert_eq!(runtime.agents().len(), 2);
/// assert_eq!(orchestrator.tools().names(), ["search_agent"]);
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
    agents: Vec<Arc<PromptAgent>>,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            agents: Vec::new(),
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the completion backend
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builder preloaded with the runtime's backend and defaults
    pub fn agent_builder(&self, name: impl Into<String>) -> PromptAgentBuilder {
        let mut builder = PromptAgent::builder(Arc::clone(&self.provider))
            .name(name)
            .model(self.config.default_model.clone())
            .max_iterations(self.config.default_max_iterations)
            .max_tokens(self.config.default_max_tokens);
        if let Some(temperature) = self.config.default_temperature {
            builder = builder.temperature(temperature);
        }
        builder
    }

    /// Build an agent and register it
    ///
    /// Fails with a configuration error when the definition is invalid or
    /// the name is already taken. No I/O happens here.
    pub fn build_agent(
        &mut self,
        name: &str,
        model: &str,
        instruction: &str,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Result<Arc<PromptAgent>> {
        let agent = self
            .agent_builder(name)
            .model(model)
            .instruction(instruction)
            .tools(tools)
            .build()?;
        self.register(agent)
    }

    /// Register a built agent
    pub fn register(&mut self, agent: PromptAgent) -> Result<Arc<PromptAgent>> {
        if self.get(agent.name()).is_some() {
            return Err(Error::Configuration(format!(
                "An agent named '{}' is already registered",
                agent.name()
            )));
        }

        info!(
            agent = agent.name(),
            model = agent.model(),
            tools = ?agent.tools().names(),
            "Agent registered"
        );
        let agent = Arc::new(agent);
        self.agents.push(Arc::clone(&agent));
        Ok(agent)
    }

    /// Wrap a registered agent for delegation, with the runtime's depth bound
    pub fn wrap_as_tool(&self, agent: &Arc<PromptAgent>) -> AgentTool {
        AgentTool::new(agent).with_max_depth(self.config.max_delegation_depth)
    }

    /// Look an agent up by name
    pub fn get(&self, name: &str) -> Option<Arc<PromptAgent>> {
        self.agents.iter().find(|a| a.name() == name).cloned()
    }

    /// Every registered agent, in registration order
    pub fn agents(&self) -> &[Arc<PromptAgent>] {
        &self.agents
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the completion backend
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Configuration("Provider not set".to_string()))?;
        if self.config.max_delegation_depth == 0 {
            return Err(Error::Configuration(
                "max_delegation_depth must be at least 1".to_string(),
            ));
        }
        Ok(AgentRuntime::new(provider, self.config))
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::ScriptedProvider;

    fn runtime() -> AgentRuntime {
        AgentRuntime::builder()
            .provider(Arc::new(
                ScriptedProvider::replying("ok").with_supported_models(&["gemini-2.0-flash"]),
            ))
            .config(RuntimeConfig {
                max_delegation_depth: 1,
                ..RuntimeConfig::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(AgentRuntime::builder().build().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut rt = runtime();
        rt.build_agent("search_agent", "gemini-2.0-flash", "Cherche", vec![])
            .unwrap();
        let err = rt
            .build_agent("search_agent", "gemini-2.0-flash", "Encore", vec![])
            .unwrap_err();

        assert!(matches!(err, Error::Configuration(ref m) if m.contains("already registered")));
        assert_eq!(rt.agents().len(), 1);
    }

    #[test]
    fn test_unknown_model_rejected() {
        let mut rt = runtime();
        let err = rt
            .build_agent("search_agent", "claude-3", "Cherche", vec![])
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(rt.get("search_agent").is_none());
    }

    #[test]
    fn test_wrap_as_tool_uses_runtime_depth() {
        let mut rt = runtime();
        let planning = rt
            .build_agent("planning_agent", "gemini-2.0-flash", "Planifie", vec![])
            .unwrap();
        let tool = rt.wrap_as_tool(&planning);

        assert_eq!(tool.max_depth(), 1);
        assert_eq!(tool.delegate_name(), "planning_agent");
        assert!(Arc::ptr_eq(&rt.get("planning_agent").unwrap(), &planning));
    }
}
