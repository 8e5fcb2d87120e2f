//! Error types for retrieval

use thiserror::Error;

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Failures of the retriever, reranker or formatter
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The request never got an HTTP response
    #[error("{0}")]
    Transport(String),

    /// The request timed out
    #[error("{0}")]
    Timeout(String),

    /// The service answered with an error status
    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },

    /// No access token could be obtained
    #[error(transparent)]
    Credentials(#[from] agent_utils::AuthError),

    /// The service answered something unparseable
    #[error("{0}")]
    InvalidResponse(String),

    /// The tool was called without a usable query
    #[error("{0}")]
    InvalidQuery(String),

    /// The documents could not be rendered
    #[error("{0}")]
    Format(String),

    /// Bad collaborator setup (e.g. unreadable corpus file)
    #[error("{0}")]
    Configuration(String),
}

impl RetrievalError {
    /// Name of the failure, shown to the model next to the message
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::Transport(_) => "TransportError",
            RetrievalError::Timeout(_) => "TimeoutError",
            RetrievalError::Http { .. } => "HttpError",
            RetrievalError::Credentials(_) => "CredentialsError",
            RetrievalError::InvalidResponse(_) => "InvalidResponseError",
            RetrievalError::InvalidQuery(_) => "InvalidQueryError",
            RetrievalError::Format(_) => "FormatError",
            RetrievalError::Configuration(_) => "ConfigurationError",
        }
    }

    /// Whether trying again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Transport(_) | RetrievalError::Timeout(_) => true,
            RetrievalError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetrievalError::Timeout(err.to_string())
        } else if err.is_decode() {
            RetrievalError::InvalidResponse(err.to_string())
        } else {
            RetrievalError::Transport(err.to_string())
        }
    }
}

impl From<agent_prompt::PromptError> for RetrievalError {
    fn from(err: agent_prompt::PromptError) -> Self {
        RetrievalError::Format(err.to_string())
    }
}
