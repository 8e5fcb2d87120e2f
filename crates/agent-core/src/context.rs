//! Execution context for agents
//!
//! The `Context` struct carries request-scoped state: a small key-value
//! store for session information, plus the chain of agents currently
//! running for this request. The chain is what bounds delegation depth and
//! detects an agent being re-entered through its own delegates.

use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Language the student writes in (e.g., "fr")
    pub const LANGUAGE: &str = "language";
    /// Session ID for tracking
    pub const SESSION_ID: &str = "session_id";
    /// School grade ("6e", "5e", "4e", "3e")
    pub const GRADE: &str = "grade";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new()
///     .with_language("fr")
///     .with_session_id("session-123");
///
/// assert_eq!(ctx.language(), Some("fr"));
/// assert_eq!(ctx.delegation_depth(), 0);
///
/// let nested = ctx.enter("orchestrator_agent").enter("search_agent");
/// assert_eq!(nested.delegation_depth(), 1);
/// assert!(nested.is_running("orchestrator_agent"));
/// assert_eq!(nested.session_id(), Some("session-123"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Key-value storage for context data
    data: HashMap<String, serde_json::Value>,
    /// Agents currently running for this request, outermost first
    call_path: Vec<String>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Set the language preference
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.insert(keys::LANGUAGE, serde_json::json!(lang.into()));
        self
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.insert(keys::SESSION_ID, serde_json::json!(session_id.into()));
        self
    }

    /// Set the school grade
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.insert(keys::GRADE, serde_json::json!(grade.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Get the language preference
    pub fn language(&self) -> Option<&str> {
        self.get(keys::LANGUAGE).and_then(|v| v.as_str())
    }

    /// Get the session ID
    pub fn session_id(&self) -> Option<&str> {
        self.get(keys::SESSION_ID).and_then(|v| v.as_str())
    }

    /// Get the school grade
    pub fn grade(&self) -> Option<&str> {
        self.get(keys::GRADE).and_then(|v| v.as_str())
    }

    // =========== Delegation Tracking ===========

    /// Child context for running `agent`, sharing all key-value data
    pub fn enter(&self, agent: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.call_path.push(agent.into());
        child
    }

    /// Agents currently running, outermost first
    pub fn call_path(&self) -> &[String] {
        &self.call_path
    }

    /// Number of delegation hops below the top-level agent
    pub fn delegation_depth(&self) -> usize {
        self.call_path.len().saturating_sub(1)
    }

    /// Whether `agent` is already running for this request
    pub fn is_running(&self, agent: &str) -> bool {
        self.call_path.iter().any(|name| name == agent)
    }

    /// The agent currently running, if any
    pub fn current_agent(&self) -> Option<&str> {
        self.call_path.last().map(String::as_str)
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
