//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad agent or tool definition, detected at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend asked for a tool the agent never declared
    #[error("Agent '{agent}' has no tool named '{tool}'")]
    UnknownTool { agent: String, tool: String },

    /// Nested delegation went deeper than the configured bound
    #[error("Delegation to '{agent}' refused: depth limit of {limit} reached")]
    DelegationDepthExceeded { agent: String, limit: usize },

    /// A delegate already running further up the call chain was invoked again
    #[error("Delegation to '{agent}' refused: already on the call path [{path}]")]
    DelegationCycle { agent: String, path: String },

    /// The delegate behind an agent tool no longer exists
    #[error("Delegate agent '{0}' is no longer available")]
    DanglingDelegate(String),

    /// The completion loop kept requesting tools
    #[error("Agent '{agent}' did not produce an answer within {max_iterations} iterations")]
    CompletionBudgetExceeded {
        agent: String,
        max_iterations: usize,
    },

    /// The completion backend failed or answered something unusable
    #[error("Completion backend error: {0}")]
    Backend(String),

    /// Agent or tool processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),
}

impl Error {
    /// Whether this is one of the delegation failures
    pub fn is_delegation(&self) -> bool {
        matches!(
            self,
            Error::DelegationDepthExceeded { .. }
                | Error::DelegationCycle { .. }
                | Error::DanglingDelegate(_)
        )
    }

    /// Whether the error must abort the whole request
    ///
    /// Anything else raised by a tool is reported back to the model as an
    /// error result and the loop carries on.
    pub fn is_request_fatal(&self) -> bool {
        self.is_delegation()
            || matches!(
                self,
                Error::UnknownTool { .. }
                    | Error::CompletionBudgetExceeded { .. }
                    | Error::Backend(_)
                    | Error::Configuration(_)
            )
    }
}
