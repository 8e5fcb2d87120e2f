//! Tool trait definition

use crate::ToolInvocation;
use agent_core::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a tool wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// An ordinary callable
    Function,
    /// Another agent, invoked by delegation
    Agent,
}

/// Value returned by a tool
///
/// `trace` carries the invocations made on the tool's behalf, which is how
/// a delegate agent's own tool calls surface in the caller's record.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Tool result
    pub content: Value,
    /// Invocations made while producing the result
    pub trace: Vec<ToolInvocation>,
}

impl ToolOutput {
    /// Output with no nested invocations
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            trace: Vec::new(),
        }
    }

    /// Attach the nested invocations
    pub fn with_trace(mut self, trace: Vec<ToolInvocation>) -> Self {
        self.trace = trace;
        self
    }

    /// Result as the text fed back to the model
    ///
    /// Strings are passed through as-is; anything else is serialized.
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(content: Value) -> Self {
        Self::new(content)
    }
}

impl From<String> for ToolOutput {
    fn from(content: String) -> Self {
        Self::new(Value::String(content))
    }
}

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description, and a JSON schema for its
/// arguments. The name is what the model uses to address it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool
    ///
    /// # Arguments
    ///
    /// * `params` - Arguments chosen by the model (should match `input_schema`)
    /// * `context` - Context of the calling agent, including its call path
    async fn execute(&self, params: Value, context: &Context) -> Result<ToolOutput>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the model decide when to use this tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema, `"type": "object"`)
    fn input_schema(&self) -> Value;

    /// What the tool wraps
    fn kind(&self) -> ToolKind {
        ToolKind::Function
    }

    /// Names of every agent this tool can end up running, transitively
    ///
    /// Used at construction time to reject an agent that would delegate
    /// back to itself.
    fn reachable_agents(&self) -> Vec<String> {
        Vec::new()
    }
}
