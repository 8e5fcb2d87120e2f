//! Agent assembly and the request boundary
//!
//! [`TutorAssistant::assemble`] builds the four specialists, wraps each as a
//! delegation tool and hands exactly those four tools to the orchestrator,
//! the root agent. [`TutorAssistant::answer`] is where per-request failures
//! stop: the student gets an apology instead of an error.

use crate::context::ProcessContext;
use crate::error::Result;
use crate::prompts;
use crate::routing::RoutingPolicy;
use crate::specialists::Specialist;
use agent_core::{Agent, Context};
use agent_retrieval::{RetrieveDocsTool, RetryPolicy};
use agent_runtime::{
    AgentRuntime, CompletionResult, ExecutorEventHandler, PromptAgent, RuntimeConfig,
};
use agent_tools::{Tool, ToolInvocation};
use std::sync::Arc;
use tracing::{error, info};

/// Name of the root agent
pub const ORCHESTRATOR_AGENT: &str = "orchestrator_agent";

const ORCHESTRATOR_DESCRIPTION: &str = "Agent orchestrateur de l'assistant scolaire. \
     Analyse la demande de l'élève et la confie aux agents spécialisés.";

/// Reply sent when a request cannot be completed
pub const APOLOGY: &str = "Désolé, je n'ai pas réussi à traiter ta demande pour le moment. \
     Peux-tu reformuler ta question ou réessayer dans quelques instants ?";

/// What the student gets back for one request
#[derive(Debug, Clone)]
pub struct TutorAnswer {
    /// Text shown to the student
    pub text: String,
    /// Set when `text` is the apology rather than a real answer
    pub degraded: bool,
    /// Tool calls of the orchestrator, with their nested calls
    pub invocations: Vec<ToolInvocation>,
    /// Orchestrator round trips
    pub iterations: usize,
    /// Internal error behind a degraded answer
    pub error: Option<String>,
}

impl TutorAnswer {
    fn completed(result: CompletionResult) -> Self {
        Self {
            text: result.text,
            degraded: false,
            invocations: result.invocations,
            iterations: result.iterations,
            error: None,
        }
    }

    fn degraded(error: &agent_core::Error) -> Self {
        Self {
            text: APOLOGY.to_string(),
            degraded: true,
            invocations: Vec::new(),
            iterations: 0,
            error: Some(error.to_string()),
        }
    }

    /// Every invocation, delegates' included, depth-first
    pub fn invoked_tools(&self) -> Vec<&ToolInvocation> {
        self.invocations
            .iter()
            .flat_map(ToolInvocation::flatten)
            .collect()
    }

    /// Specialists the orchestrator delegated to, in call order
    pub fn delegations(&self) -> Vec<&str> {
        self.invocations
            .iter()
            .filter(|i| i.kind == agent_tools::ToolKind::Agent)
            .map(|i| i.tool.as_str())
            .collect()
    }
}

/// The assembled agent tree
pub struct TutorAssistant {
    runtime: AgentRuntime,
    orchestrator: Arc<PromptAgent>,
    policy: RoutingPolicy,
}

impl TutorAssistant {
    /// Build every agent from `context`
    pub fn assemble(context: &ProcessContext) -> Result<Self> {
        Self::assemble_with_handler(context, None)
    }

    /// Same as [`TutorAssistant::assemble`], reporting tool activity of every
    /// agent to `handler`
    pub fn assemble_with_handler(
        context: &ProcessContext,
        handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<Self> {
        let config = context.config();
        let mut runtime = AgentRuntime::builder()
            .provider(Arc::clone(context.provider()))
            .config(RuntimeConfig {
                default_model: config.model.clone(),
                default_max_iterations: config.max_iterations,
                default_max_tokens: config.max_tokens,
                default_temperature: Some(config.temperature),
                max_delegation_depth: config.max_delegation_depth,
            })
            .build()?;

        let retrieve_docs: Arc<dyn Tool> = Arc::new(
            RetrieveDocsTool::new(
                Arc::clone(context.retriever()),
                Arc::clone(context.reranker()),
                prompts::docs_formatter(context.prompts())?,
            )
            .with_max_documents(config.max_documents)
            .with_retry_policy(RetryPolicy::with_attempts(config.retrieval_attempts)),
        );

        let mut delegates: Vec<Arc<dyn Tool>> = Vec::with_capacity(Specialist::ALL.len());
        for specialist in Specialist::ALL {
            let tools = if specialist.uses_retrieval() {
                vec![Arc::clone(&retrieve_docs)]
            } else {
                Vec::new()
            };

            let mut builder = runtime
                .agent_builder(specialist.agent_name())
                .description(specialist.description())
                .instruction(prompts::specialist_instruction(context.prompts(), specialist)?)
                .tools(tools);
            if let Some(handler) = &handler {
                builder = builder.event_handler(Arc::clone(handler));
            }

            let agent = runtime.register(builder.build()?)?;
            delegates.push(Arc::new(runtime.wrap_as_tool(&agent)));
        }

        let mut builder = runtime
            .agent_builder(ORCHESTRATOR_AGENT)
            .description(ORCHESTRATOR_DESCRIPTION)
            .instruction(prompts::orchestrator_instruction(
                context.prompts(),
                context.policy(),
            )?)
            .tools(delegates);
        if let Some(handler) = &handler {
            builder = builder.event_handler(Arc::clone(handler));
        }
        let orchestrator = runtime.register(builder.build()?)?;

        info!(
            root = orchestrator.name(),
            agents = runtime.agents().len(),
            policy = %context.policy().version,
            "Tutoring assistant assembled"
        );

        Ok(Self {
            runtime,
            orchestrator,
            policy: context.policy().clone(),
        })
    }

    /// Request context for a French-speaking student session
    pub fn session(session_id: impl Into<String>) -> Context {
        Context::new().with_language("fr").with_session_id(session_id)
    }

    /// The orchestrator
    pub fn root_agent(&self) -> &Arc<PromptAgent> {
        &self.orchestrator
    }

    /// Every agent, specialists first, orchestrator last
    pub fn agents(&self) -> &[Arc<PromptAgent>] {
        self.runtime.agents()
    }

    /// Agent behind `specialist`
    pub fn specialist(&self, specialist: Specialist) -> Option<Arc<PromptAgent>> {
        self.runtime.get(specialist.agent_name())
    }

    /// Routing policy the orchestrator instruction was rendered from
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Run the orchestrator on `query`, surfacing any failure
    pub async fn ask(
        &self,
        query: impl Into<String>,
        context: &Context,
    ) -> agent_core::Result<CompletionResult> {
        self.orchestrator.run(query, context).await
    }

    /// Run the orchestrator on `query`; failures become an apology
    pub async fn answer(&self, query: impl Into<String>, context: &Context) -> TutorAnswer {
        match self.ask(query, context).await {
            Ok(result) => TutorAnswer::completed(result),
            Err(err) => {
                error!(
                    error = %err,
                    delegation = err.is_delegation(),
                    session = context.session_id().unwrap_or_default(),
                    "Request failed"
                );
                TutorAnswer::degraded(&err)
            }
        }
    }
}

impl std::fmt::Debug for TutorAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TutorAssistant")
            .field("orchestrator", &self.orchestrator)
            .field("agents", &self.runtime.agents().len())
            .field("policy", &self.policy.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TutorConfig;
    use agent_llm::testing::ScriptedProvider;
    use agent_retrieval::{IdentityReranker, InMemoryRetriever};
    use agent_tools::ToolKind;
    use std::collections::HashSet;

    fn assistant() -> TutorAssistant {
        let context = ProcessContext::builder(TutorConfig::builder().project_id("p").build().unwrap())
            .provider(Arc::new(ScriptedProvider::replying("Bonjour !")))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();
        TutorAssistant::assemble(&context).unwrap()
    }

    #[test]
    fn test_five_uniquely_named_agents() {
        let assistant = assistant();
        let names: Vec<_> = assistant.agents().iter().map(|a| a.name().to_string()).collect();

        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| !n.is_empty()));
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), 5);
        assert_eq!(assistant.root_agent().name(), ORCHESTRATOR_AGENT);
        assert!(Arc::ptr_eq(
            assistant.root_agent(),
            assistant.agents().last().unwrap()
        ));
    }

    #[test]
    fn test_orchestrator_tools_are_the_specialists() {
        let assistant = assistant();
        let tools = assistant.root_agent().tools();

        assert_eq!(
            tools.names(),
            ["search_agent", "pedagogical_agent", "assessment_agent", "planning_agent"]
        );
        for tool in tools.list_tools() {
            assert_eq!(tool.kind(), ToolKind::Agent);
            let specialist: Specialist = tool.name().parse().unwrap();
            assert_eq!(tool.description(), specialist.description());
        }
    }

    #[test]
    fn test_only_search_agent_retrieves() {
        let assistant = assistant();
        for specialist in Specialist::ALL {
            let agent = assistant.specialist(specialist).unwrap();
            let expected: &[&str] = if specialist.uses_retrieval() {
                &["retrieve_docs"]
            } else {
                &[]
            };
            assert_eq!(agent.tools().names(), expected);
            assert_eq!(agent.model(), "gemini-2.0-flash");
        }
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let answer = assistant().answer("bonjour", &TutorAssistant::session("s1")).await;
        assert_eq!(answer.text, "Bonjour !");
        assert!(!answer.degraded);
        assert!(answer.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let provider = ScriptedProvider::fallible(|_| {
            Err(agent_llm::LLMError::RateLimitExceeded("quota".to_string()))
        });
        let context = ProcessContext::builder(TutorConfig::builder().project_id("p").build().unwrap())
            .provider(Arc::new(provider))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();
        let assistant = TutorAssistant::assemble(&context).unwrap();

        let answer = assistant.answer("Organise mes révisions", &Context::new()).await;
        assert!(answer.degraded);
        assert_eq!(answer.text, APOLOGY);
        assert!(answer.error.unwrap().contains("quota"));
        assert!(assistant.ask("Organise mes révisions", &Context::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_blocked_specialist_answer_degrades() {
        use agent_llm::testing::{text_response, tool_call_response};
        use serde_json::json;

        let provider = ScriptedProvider::fallible(|request| {
            let system = request.system.clone().unwrap_or_default();
            if system.contains("ORCHESTRATEUR") {
                if request.is_tool_followup() {
                    Ok(text_response("Voici l'explication"))
                } else {
                    Ok(tool_call_response(vec![(
                        "pedagogical_agent",
                        json!({"request": "Explique la reproduction"}),
                    )]))
                }
            } else {
                Err(agent_llm::LLMError::ResponseBlocked("SAFETY".to_string()))
            }
        });
        let context = ProcessContext::builder(TutorConfig::builder().project_id("p").build().unwrap())
            .provider(Arc::new(provider))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();
        let assistant = TutorAssistant::assemble(&context).unwrap();

        let answer = assistant.answer("Explique la reproduction", &Context::new()).await;
        assert!(answer.degraded);
        assert_eq!(answer.text, APOLOGY);
        assert!(answer.error.unwrap().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_model_answer_degrades() {
        let context = ProcessContext::builder(TutorConfig::builder().project_id("p").build().unwrap())
            .provider(Arc::new(ScriptedProvider::replying("")))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();
        let assistant = TutorAssistant::assemble(&context).unwrap();

        let answer = assistant.answer("bonjour", &Context::new()).await;
        assert!(answer.degraded);
        assert!(!answer.text.is_empty());
    }
}
