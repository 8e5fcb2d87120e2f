//! Error types for the tutoring assistant

use thiserror::Error;

/// Failures while configuring or assembling the assistant
#[derive(Debug, Error)]
pub enum TutorError {
    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment variable could not be read
    #[error(transparent)]
    Env(#[from] agent_utils::ConfigError),

    /// Routing policy could not be loaded or is inconsistent
    #[error("Routing policy error: {0}")]
    RoutingPolicy(String),

    /// Prompt template failure
    #[error(transparent)]
    Prompt(#[from] agent_prompt::PromptError),

    /// Retrieval collaborator could not be set up
    #[error(transparent)]
    Retrieval(#[from] agent_retrieval::RetrievalError),

    /// Completion backend could not be set up
    #[error(transparent)]
    Backend(#[from] agent_llm::LLMError),

    /// Agent construction or execution failure
    #[error(transparent)]
    Agent(#[from] agent_core::Error),
}

/// Result type alias for the tutoring assistant
pub type Result<T> = std::result::Result<T, TutorError>;

impl From<TutorError> for agent_core::Error {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::Agent(inner) => inner,
            other => agent_core::Error::Configuration(other.to_string()),
        }
    }
}
