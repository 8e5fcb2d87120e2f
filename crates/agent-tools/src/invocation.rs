//! Records of tool invocations made during a completion loop

use crate::ToolKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The tool returned a result
    Success {
        /// Text fed back to the model
        content: String,
    },
    /// The tool failed
    Failure {
        /// Error message
        error: String,
    },
}

/// One tool call made by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name as requested by the model
    pub tool: String,
    /// What the tool wraps
    pub kind: ToolKind,
    /// Arguments sent by the model
    pub arguments: Value,
    /// Result or error
    pub outcome: InvocationOutcome,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Invocations made by the tool itself (a delegate's own tool calls)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<ToolInvocation>,
}

impl ToolInvocation {
    /// The query handed to the tool
    ///
    /// Agent tools take a `request` argument; retrieval takes `query`.
    pub fn sub_query(&self) -> Option<&str> {
        ["request", "query"]
            .iter()
            .find_map(|key| self.arguments.get(*key).and_then(Value::as_str))
    }

    /// Whether the tool returned a result
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Success { .. })
    }

    /// This invocation followed by every nested one, depth-first
    pub fn flatten(&self) -> Vec<&ToolInvocation> {
        let mut out = vec![self];
        for child in &self.nested {
            out.extend(child.flatten());
        }
        out
    }
}
