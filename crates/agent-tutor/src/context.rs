//! Process-wide collaborators
//!
//! [`initialize`] builds everything the assistant needs exactly once:
//! completion backend, credentials, retriever, reranker, prompts and
//! routing policy. The resulting [`ProcessContext`] is passed explicitly to
//! [`crate::TutorAssistant::assemble`]. Tests build one with injected fakes
//! through [`ProcessContext::builder`].

use crate::config::TutorConfig;
use crate::error::{Result, TutorError};
use crate::prompts;
use crate::routing::RoutingPolicy;
use agent_llm::LLMProvider;
use agent_llm::providers::GeminiProvider;
use agent_prompt::PromptRegistry;
use agent_retrieval::{
    GoogleApiClient, IdentityReranker, InMemoryRetriever, Reranker, Retriever, VertexEmbedder,
    VertexRankReranker, VertexSearchConfig, VertexSearchRetriever,
};
use agent_utils::auth::token_source_from_env;
use agent_utils::{AccessTokenSource, ProcessEnv};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Collaborators shared by every request
#[derive(Clone)]
pub struct ProcessContext {
    config: TutorConfig,
    provider: Arc<dyn LLMProvider>,
    retriever: Arc<dyn Retriever>,
    reranker: Arc<dyn Reranker>,
    prompts: Arc<PromptRegistry>,
    policy: RoutingPolicy,
}

/// Build the process context from `config` with Vertex AI collaborators
pub fn initialize(config: TutorConfig) -> Result<ProcessContext> {
    ProcessContext::builder(config).build()
}

impl ProcessContext {
    /// Builder starting from `config`
    pub fn builder(config: TutorConfig) -> ProcessContextBuilder {
        ProcessContextBuilder::new(config)
    }

    /// Configuration in effect
    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    /// Completion backend
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Document retriever
    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.retriever
    }

    /// Document reranker
    pub fn reranker(&self) -> &Arc<dyn Reranker> {
        &self.reranker
    }

    /// Prompt templates
    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Routing policy
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .field("prompts", &self.prompts)
            .field("policy", &self.policy.version)
            .finish_non_exhaustive()
    }
}

/// Builder for ProcessContext
///
/// Anything not injected is built from the configuration: the Gemini
/// backend, Vertex AI Search with query embeddings, and the Ranking API.
pub struct ProcessContextBuilder {
    config: TutorConfig,
    provider: Option<Arc<dyn LLMProvider>>,
    credentials: Option<Arc<dyn AccessTokenSource>>,
    retriever: Option<Arc<dyn Retriever>>,
    reranker: Option<Arc<dyn Reranker>>,
    offline_corpus: Option<PathBuf>,
    prompts_dir: Option<PathBuf>,
    policy: Option<RoutingPolicy>,
    policy_file: Option<PathBuf>,
}

impl ProcessContextBuilder {
    fn new(config: TutorConfig) -> Self {
        Self {
            config,
            provider: None,
            credentials: None,
            retriever: None,
            reranker: None,
            offline_corpus: None,
            prompts_dir: None,
            policy: None,
            policy_file: None,
        }
    }

    /// Use `provider` as completion backend
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use `credentials` for every Google Cloud call
    pub fn credentials(mut self, credentials: Arc<dyn AccessTokenSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use `retriever` for document search
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Use `reranker` after document search
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Search a local JSON corpus instead of Vertex AI Search
    ///
    /// Reranking is skipped unless a reranker is injected as well.
    pub fn offline_corpus(mut self, path: impl Into<PathBuf>) -> Self {
        self.offline_corpus = Some(path.into());
        self
    }

    /// Override built-in templates with the `.j2` files of `dir`
    pub fn prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = Some(dir.into());
        self
    }

    /// Use `policy` instead of the built-in routing policy
    pub fn routing_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Load the routing policy from a JSON file
    pub fn routing_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_file = Some(path.into());
        self
    }

    /// Build the context
    pub fn build(self) -> Result<ProcessContext> {
        self.config.validate()?;

        let policy = match (self.policy, &self.policy_file) {
            (Some(policy), _) => {
                policy.validate()?;
                policy
            }
            (None, Some(path)) => RoutingPolicy::from_file(path)?,
            (None, None) => RoutingPolicy::builtin()?,
        };

        let prompts = prompts::registry_with_overrides(self.prompts_dir.as_deref())?;

        let credentials = self
            .credentials
            .unwrap_or_else(|| token_source_from_env(&ProcessEnv));

        let provider: Arc<dyn LLMProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(GeminiProvider::new(
                self.config.gemini_config()?,
                Some(Arc::clone(&credentials)),
            )?),
        };

        let offline = self.offline_corpus.is_some();
        let retriever: Arc<dyn Retriever> = match (self.retriever, &self.offline_corpus) {
            (Some(retriever), _) => retriever,
            (None, Some(path)) => Arc::new(InMemoryRetriever::from_json_file(path)?),
            (None, None) => vertex_retriever(&self.config, &credentials)?,
        };

        let reranker: Arc<dyn Reranker> = match self.reranker {
            Some(reranker) => reranker,
            None if offline => Arc::new(IdentityReranker),
            None => Arc::new(VertexRankReranker::new(google_client(&self.config, &credentials)?)),
        };

        info!(
            model = %self.config.model,
            backend = provider.name(),
            credentials = credentials.name(),
            offline,
            policy = %policy.version,
            templates = prompts.len(),
            "Process context initialized"
        );

        Ok(ProcessContext {
            config: self.config,
            provider,
            retriever,
            reranker,
            prompts: Arc::new(prompts),
            policy,
        })
    }
}

fn google_client(
    config: &TutorConfig,
    credentials: &Arc<dyn AccessTokenSource>,
) -> Result<GoogleApiClient> {
    let project = config.require_project("Vertex AI Search (or pass an offline corpus)")?;
    Ok(GoogleApiClient::new(project, Arc::clone(credentials))?)
}

fn vertex_retriever(
    config: &TutorConfig,
    credentials: &Arc<dyn AccessTokenSource>,
) -> Result<Arc<dyn Retriever>> {
    if config.data_store_id.trim().is_empty() {
        return Err(TutorError::Config("DATA_STORE_ID must not be empty".to_string()));
    }

    let client = google_client(config, credentials)?;
    let embedder = VertexEmbedder::new(
        client.clone(),
        config.location.clone(),
        config.embedding_model.clone(),
    );
    let search_config =
        VertexSearchConfig::new(config.data_store_id.clone(), config.data_store_region.clone())
            .with_embedding_field(config.embedding_column.clone());

    Ok(Arc::new(
        VertexSearchRetriever::new(client, search_config).with_embedder(Arc::new(embedder)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::ScriptedProvider;
    use agent_utils::StaticToken;

    fn config() -> TutorConfig {
        TutorConfig::builder().project_id("mon-projet").build().unwrap()
    }

    #[test]
    fn test_injected_collaborators() {
        let context = ProcessContext::builder(config())
            .provider(Arc::new(ScriptedProvider::replying("ok")))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .reranker(Arc::new(IdentityReranker))
            .build()
            .unwrap();

        assert_eq!(context.provider().name(), "scripted");
        assert_eq!(context.policy().routes.len(), 4);
        assert!(context.prompts().contains("orchestrator_agent"));
    }

    #[test]
    fn test_vertex_collaborators_built_without_io() {
        let context = ProcessContext::builder(config())
            .credentials(Arc::new(StaticToken::new("token")))
            .build()
            .unwrap();
        assert_eq!(context.provider().name(), "gemini");
    }

    #[test]
    fn test_offline_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.json");
        std::fs::write(&corpus, r#"[{"source_id": "svt-1", "content": "La photosynthèse"}]"#).unwrap();

        let context = ProcessContext::builder(config())
            .provider(Arc::new(ScriptedProvider::replying("ok")))
            .offline_corpus(&corpus)
            .build()
            .unwrap();

        let docs = tokio_test::block_on(context.retriever().retrieve("photosynthèse", 5)).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let result = ProcessContext::builder(config())
            .provider(Arc::new(ScriptedProvider::replying("ok")))
            .offline_corpus("/nonexistent/corpus.json")
            .build();
        assert!(matches!(result, Err(TutorError::Retrieval(_))));
    }

    #[test]
    fn test_invalid_policy_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routing.json");
        std::fs::write(&path, r#"{"version": "x", "routes": []}"#).unwrap();

        let result = ProcessContext::builder(config())
            .provider(Arc::new(ScriptedProvider::replying("ok")))
            .retriever(Arc::new(InMemoryRetriever::default()))
            .routing_policy_file(&path)
            .build();
        assert!(matches!(result, Err(TutorError::RoutingPolicy(_))));
    }
}
