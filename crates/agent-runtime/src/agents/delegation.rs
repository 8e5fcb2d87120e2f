//! Agent-as-tool delegation
//!
//! [`AgentTool`] lets one agent list another in its tool set. Invoking the
//! tool runs the delegate's whole completion loop on a sub-query and hands
//! back its final text. The delegate is held through a `Weak` reference:
//! the runtime owns agents, tools only point at them.

use crate::agents::PromptAgent;
use crate::executor::CompletionResult;
use agent_core::{Agent, Context, Error, Result};
use agent_llm::tools::schema;
use agent_tools::{Tool, ToolKind, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tracing::{info, warn};

/// Argument carrying the sub-query
pub const REQUEST_ARG: &str = "request";

/// Default bound on nested delegation hops
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// A delegate agent exposed as a tool
pub struct AgentTool {
    delegate: Weak<PromptAgent>,
    delegate_name: String,
    name: String,
    description: String,
    max_depth: usize,
    reachable: Vec<String>,
}

impl AgentTool {
    /// Wrap `agent`; name and description default to the agent's own
    pub fn new(agent: &Arc<PromptAgent>) -> Self {
        let mut reachable = agent.tools().reachable_agents();
        reachable.push(agent.name().to_string());
        reachable.sort();
        reachable.dedup();

        Self {
            delegate: Arc::downgrade(agent),
            delegate_name: agent.name().to_string(),
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            reachable,
        }
    }

    /// Override the name the model sees
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the description the model sees
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the delegation depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Name of the wrapped agent
    pub fn delegate_name(&self) -> &str {
        &self.delegate_name
    }

    /// Delegation depth bound
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Run the delegate on `sub_query`
    ///
    /// `caller_context` is the context of the agent making the call. Fails
    /// with a delegation error when the delegate is gone, already on the
    /// call path, or the depth bound is reached.
    pub async fn invoke(&self, sub_query: &str, caller_context: &Context) -> Result<CompletionResult> {
        let delegate = self
            .delegate
            .upgrade()
            .ok_or_else(|| Error::DanglingDelegate(self.delegate_name.clone()))?;

        if caller_context.is_running(&self.delegate_name) {
            warn!(delegate = %self.delegate_name, path = ?caller_context.call_path(), "Delegation cycle refused");
            return Err(Error::DelegationCycle {
                agent: self.delegate_name.clone(),
                path: caller_context.call_path().join(" > "),
            });
        }

        let depth = caller_context.delegation_depth();
        if depth >= self.max_depth {
            warn!(delegate = %self.delegate_name, depth, max_depth = self.max_depth, "Delegation depth limit reached");
            return Err(Error::DelegationDepthExceeded {
                agent: self.delegate_name.clone(),
                limit: self.max_depth,
            });
        }

        info!(
            caller = caller_context.current_agent().unwrap_or("<root>"),
            delegate = %self.delegate_name,
            depth = depth + 1,
            "Delegating request"
        );
        delegate.run(sub_query, caller_context).await
    }
}

#[async_trait]
impl Tool for AgentTool {
    async fn execute(&self, params: Value, context: &Context) -> Result<ToolOutput> {
        let sub_query = params
            .get(REQUEST_ARG)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::ProcessingFailed(format!(
                    "Tool '{}' requires a string argument '{REQUEST_ARG}'",
                    self.name
                ))
            })?;

        let result = self.invoke(sub_query, context).await?;
        Ok(ToolOutput::new(Value::String(result.text)).with_trace(result.invocations))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::single_string(REQUEST_ARG, "La demande à transmettre à l'agent spécialisé")
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Agent
    }

    fn reachable_agents(&self) -> Vec<String> {
        self.reachable.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::{ScriptedProvider, last_tool_results, text_response, tool_call_response};
    use agent_llm::LLMProvider;
    use serde_json::json;

    fn specialist(provider: Arc<dyn LLMProvider>, name: &str) -> Arc<PromptAgent> {
        Arc::new(
            PromptAgent::builder(provider)
                .name(name)
                .description(format!("Agent {name}"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_wrapper_defaults_and_overrides() {
        let agent = specialist(Arc::new(ScriptedProvider::replying("ok")), "search_agent");
        let tool = AgentTool::new(&agent);

        assert_eq!(tool.name(), "search_agent");
        assert_eq!(tool.description(), "Agent search_agent");
        assert_eq!(tool.kind(), ToolKind::Agent);
        assert_eq!(tool.reachable_agents(), ["search_agent"]);
        assert_eq!(tool.input_schema()["required"][0], "request");

        let renamed = AgentTool::new(&agent)
            .with_name("chercheur")
            .with_description("Cherche");
        assert_eq!(renamed.name(), "chercheur");
        assert_eq!(renamed.delegate_name(), "search_agent");
    }

    #[tokio::test]
    async fn test_delegation_returns_delegate_text_and_trace() {
        let provider: Arc<dyn LLMProvider> = Arc::new(ScriptedProvider::new(|request| {
            let system = request.system.clone().unwrap_or_default();
            if system.contains("orchestrateur") {
                if request.is_tool_followup() {
                    text_response(format!("Synthèse: {}", last_tool_results(request)[0].1))
                } else {
                    tool_call_response(vec![("search_agent", json!({"request": "photosynthèse"}))])
                }
            } else {
                text_response("La photosynthèse produit du glucose")
            }
        }));

        let search = specialist(provider.clone(), "search_agent");
        let orchestrator = PromptAgent::builder(provider)
            .name("orchestrator_agent")
            .instruction("Tu es l'orchestrateur")
            .tool(Arc::new(AgentTool::new(&search)))
            .build()
            .unwrap();

        let result = orchestrator.run("photosynthèse ?", &Context::new()).await.unwrap();
        assert_eq!(result.text, "Synthèse: La photosynthèse produit du glucose");
        assert_eq!(result.invocations.len(), 1);
        assert_eq!(result.invocations[0].kind, ToolKind::Agent);
        assert_eq!(result.invocations[0].sub_query(), Some("photosynthèse"));
    }

    #[tokio::test]
    async fn test_dangling_delegate() {
        let agent = specialist(Arc::new(ScriptedProvider::replying("ok")), "planning_agent");
        let tool = AgentTool::new(&agent);
        drop(agent);

        let err = tool
            .execute(json!({"request": "plan"}), &Context::new().enter("orchestrator_agent"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DanglingDelegate(ref name) if name == "planning_agent"));
        assert!(err.is_request_fatal());
    }

    #[tokio::test]
    async fn test_cycle_refused() {
        let agent = specialist(Arc::new(ScriptedProvider::replying("ok")), "search_agent");
        let tool = AgentTool::new(&agent);

        let ctx = Context::new().enter("orchestrator_agent").enter("search_agent");
        let err = tool.invoke("encore", &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            Error::DelegationCycle { ref path, .. } if path == "orchestrator_agent > search_agent"
        ));
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let agent = specialist(Arc::new(ScriptedProvider::replying("ok")), "assessment_agent");
        let tool = AgentTool::new(&agent).with_max_depth(1);

        // Depth 0 caller may delegate once
        let top = Context::new().enter("orchestrator_agent");
        assert!(tool.invoke("quiz", &top).await.is_ok());

        // A delegate at depth 1 may not go further
        let nested = top.enter("pedagogical_agent");
        let err = tool.invoke("quiz", &nested).await.unwrap_err();
        assert!(matches!(err, Error::DelegationDepthExceeded { limit: 1, .. }));
    }

    #[test]
    fn test_self_delegation_rejected_at_build() {
        let provider: Arc<dyn LLMProvider> = Arc::new(ScriptedProvider::replying("ok"));
        let orchestrator = specialist(provider.clone(), "orchestrator_agent");

        let err = PromptAgent::builder(provider)
            .name("orchestrator_agent")
            .tool(Arc::new(AgentTool::new(&orchestrator)))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("itself")));
    }

    #[tokio::test]
    async fn test_missing_request_argument() {
        let agent = specialist(Arc::new(ScriptedProvider::replying("ok")), "search_agent");
        let err = AgentTool::new(&agent)
            .execute(json!({"query": "x"}), &Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProcessingFailed(_)));
        assert!(!err.is_request_fatal());
    }
}
