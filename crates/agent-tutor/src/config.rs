//! Configuration for the tutoring assistant
//!
//! Read once at startup from an [`EnvSource`]; see [`TutorConfig::from_source`]
//! for the variable names.

use crate::error::{Result, TutorError};
use agent_llm::providers::GeminiConfig;
use agent_utils::{AccessTokenSource, EnvSource, ProcessEnv};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default completion model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-005";
/// Default data store
pub const DEFAULT_DATA_STORE_ID: &str = "mon-agent-scolaire-datastore";

/// Configuration for the tutoring assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Google Cloud project (required for every Vertex AI collaborator)
    pub project_id: Option<String>,

    /// Location of the Gemini endpoint
    pub llm_location: String,

    /// Region of the embedding model
    pub location: String,

    /// Model used by every agent
    pub model: String,

    /// Embedding model feeding the search ranking
    pub embedding_model: String,

    /// Vertex AI Search data store
    pub data_store_id: String,

    /// Location of the data store
    pub data_store_region: String,

    /// Data store field holding document embeddings
    pub embedding_column: String,

    /// Documents requested per search
    pub max_documents: usize,

    /// Backend round trips allowed per agent run
    pub max_iterations: usize,

    /// Bound on nested delegation hops
    pub max_delegation_depth: usize,

    /// Attempts per retrieval call, the first one included
    pub retrieval_attempts: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Gemini Developer API key; selects that API over Vertex AI
    #[serde(skip_serializing, default)]
    pub gemini_api_key: Option<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            llm_location: "global".to_string(),
            location: "us-central1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            data_store_id: DEFAULT_DATA_STORE_ID.to_string(),
            data_store_region: "us".to_string(),
            embedding_column: "embedding".to_string(),
            max_documents: 10,
            max_iterations: 10,
            max_delegation_depth: 2,
            retrieval_attempts: 2,
            temperature: 0.7,
            max_tokens: 4096,
            gemini_api_key: None,
        }
    }
}

impl TutorConfig {
    /// Create a new configuration builder
    pub fn builder() -> TutorConfigBuilder {
        TutorConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Read the process environment, taking the project from `credentials`
    /// when `GOOGLE_CLOUD_PROJECT` is unset
    pub async fn from_env_with_credentials(credentials: &dyn AccessTokenSource) -> Result<Self> {
        Self::from_source_with_credentials(&ProcessEnv, credentials).await
    }

    /// Like [`Self::from_source`], but a Vertex AI setup without
    /// `GOOGLE_CLOUD_PROJECT` falls back to the project the credentials
    /// belong to.
    pub async fn from_source_with_credentials<E: EnvSource>(
        env: &E,
        credentials: &dyn AccessTokenSource,
    ) -> Result<Self> {
        let mut config = Self::read(env)?;
        if config.project_id.is_none() && !config.uses_developer_api() {
            config.project_id = credentials.project_id().await;
            if let Some(project) = &config.project_id {
                info!(project = %project, source = credentials.name(), "Using the credentials project");
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from `env`
    ///
    /// | variable | field |
    /// | --- | --- |
    /// | `GOOGLE_CLOUD_PROJECT` | `project_id` |
    /// | `GOOGLE_CLOUD_LOCATION` | `llm_location` |
    /// | `TUTOR_LOCATION` | `location` |
    /// | `TUTOR_MODEL` | `model` |
    /// | `TUTOR_EMBEDDING_MODEL` | `embedding_model` |
    /// | `DATA_STORE_ID` | `data_store_id` |
    /// | `DATA_STORE_REGION` | `data_store_region` |
    /// | `TUTOR_EMBEDDING_COLUMN` | `embedding_column` |
    /// | `TUTOR_MAX_DOCUMENTS` | `max_documents` |
    /// | `TUTOR_MAX_ITERATIONS` | `max_iterations` |
    /// | `TUTOR_MAX_DELEGATION_DEPTH` | `max_delegation_depth` |
    /// | `TUTOR_RETRIEVAL_ATTEMPTS` | `retrieval_attempts` |
    /// | `TUTOR_TEMPERATURE` | `temperature` |
    /// | `TUTOR_MAX_TOKENS` | `max_tokens` |
    /// | `GEMINI_API_KEY` | `gemini_api_key` |
    pub fn from_source<E: EnvSource>(env: &E) -> Result<Self> {
        let config = Self::read(env)?;
        config.validate()?;
        Ok(config)
    }

    fn read<E: EnvSource>(env: &E) -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            project_id: env.var("GOOGLE_CLOUD_PROJECT"),
            llm_location: env.var_or("GOOGLE_CLOUD_LOCATION", &d.llm_location),
            location: env.var_or("TUTOR_LOCATION", &d.location),
            model: env.var_or("TUTOR_MODEL", &d.model),
            embedding_model: env.var_or("TUTOR_EMBEDDING_MODEL", &d.embedding_model),
            data_store_id: env.var_or("DATA_STORE_ID", &d.data_store_id),
            data_store_region: env.var_or("DATA_STORE_REGION", &d.data_store_region),
            embedding_column: env.var_or("TUTOR_EMBEDDING_COLUMN", &d.embedding_column),
            max_documents: env.parse_or("TUTOR_MAX_DOCUMENTS", d.max_documents)?,
            max_iterations: env.parse_or("TUTOR_MAX_ITERATIONS", d.max_iterations)?,
            max_delegation_depth: env.parse_or("TUTOR_MAX_DELEGATION_DEPTH", d.max_delegation_depth)?,
            retrieval_attempts: env.parse_or("TUTOR_RETRIEVAL_ATTEMPTS", d.retrieval_attempts)?,
            temperature: env.parse_or("TUTOR_TEMPERATURE", d.temperature)?,
            max_tokens: env.parse_or("TUTOR_MAX_TOKENS", d.max_tokens)?,
            gemini_api_key: env.var("GEMINI_API_KEY"),
        })
    }

    /// Whether completions go through the Gemini Developer API
    pub fn uses_developer_api(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    /// Project id, or an error naming the collaborator that needs it
    pub fn require_project(&self, purpose: &str) -> Result<&str> {
        self.project_id.as_deref().ok_or_else(|| {
            TutorError::Config(format!("GOOGLE_CLOUD_PROJECT is required for {purpose}"))
        })
    }

    /// Endpoint configuration for the completion backend
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        match &self.gemini_api_key {
            Some(key) => Ok(GeminiConfig::developer_api(key.clone())),
            None => Ok(GeminiConfig::vertex(
                self.require_project("Vertex AI completions")?,
                self.llm_location.clone(),
            )),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(TutorError::Config("model must not be empty".to_string()));
        }
        if self.max_documents == 0 {
            return Err(TutorError::Config("max_documents must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(TutorError::Config("max_iterations must be at least 1".to_string()));
        }
        if self.max_delegation_depth == 0 {
            return Err(TutorError::Config(
                "max_delegation_depth must be at least 1".to_string(),
            ));
        }
        if self.retrieval_attempts == 0 {
            return Err(TutorError::Config(
                "retrieval_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(TutorError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !self.uses_developer_api() && self.project_id.is_none() {
            return Err(TutorError::Config(
                "GOOGLE_CLOUD_PROJECT is required unless GEMINI_API_KEY is set or the credentials name a project"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for TutorConfig
#[derive(Debug, Default)]
pub struct TutorConfigBuilder {
    config: Option<TutorConfig>,
}

impl TutorConfigBuilder {
    fn with(mut self, update: impl FnOnce(&mut TutorConfig)) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        update(&mut config);
        self.config = Some(config);
        self
    }

    /// Set the Google Cloud project
    pub fn project_id(self, project: impl Into<String>) -> Self {
        let project = project.into();
        self.with(|c| c.project_id = Some(project))
    }

    /// Use the Gemini Developer API with `key`
    pub fn gemini_api_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.with(|c| c.gemini_api_key = Some(key))
    }

    /// Set the completion model
    pub fn model(self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.with(|c| c.model = model)
    }

    /// Set the data store
    pub fn data_store(self, id: impl Into<String>, region: impl Into<String>) -> Self {
        let (id, region) = (id.into(), region.into());
        self.with(|c| {
            c.data_store_id = id;
            c.data_store_region = region;
        })
    }

    /// Set documents requested per search
    pub fn max_documents(self, max: usize) -> Self {
        self.with(|c| c.max_documents = max)
    }

    /// Set backend round trips per agent run
    pub fn max_iterations(self, max: usize) -> Self {
        self.with(|c| c.max_iterations = max)
    }

    /// Set the delegation depth bound
    pub fn max_delegation_depth(self, depth: usize) -> Self {
        self.with(|c| c.max_delegation_depth = depth)
    }

    /// Set attempts per retrieval call
    pub fn retrieval_attempts(self, attempts: u32) -> Self {
        self.with(|c| c.retrieval_attempts = attempts)
    }

    /// Set the sampling temperature
    pub fn temperature(self, temperature: f32) -> Self {
        self.with(|c| c.temperature = temperature)
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TutorConfig> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}
