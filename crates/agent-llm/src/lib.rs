//! Completion backend abstraction for the tutoring agents
//!
//! This crate provides provider-agnostic types for talking to a large
//! language model:
//!
//! - Message types for the conversation, including tool calls and results
//! - Completion request/response types
//! - Tool definitions (the manifest sent along with every request)
//! - The [`LLMProvider`] trait
//! - The Gemini provider (behind the `gemini` feature)
//! - A scripted provider for tests (behind the `testing` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role, ToolCall};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
