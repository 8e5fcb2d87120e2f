//! Agent runtime for the tutoring agents
//!
//! This crate provides the runtime infrastructure for running agents:
//! the completion loop ([`AgentExecutor`]), the instruction-driven
//! [`PromptAgent`], the [`AgentTool`] delegation wrapper, and the
//! [`AgentRuntime`] registry that builds and owns the agents.

pub mod agents;
pub mod executor;
pub mod runtime;

// Re-export key types
pub use agents::{AgentTool, PromptAgent, PromptAgentBuilder};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, CompletionResult, ExecutorConfig, ExecutorEventHandler,
    LoopState, NoOpEventHandler,
};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
