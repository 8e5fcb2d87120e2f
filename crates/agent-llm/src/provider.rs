//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for completion backends
///
/// A provider turns a [`CompletionRequest`] (instruction, tool manifest,
/// conversation) into either a final answer or a request to call tools.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Whether `model` is a model identifier this backend can serve
    ///
    /// Checked when agents are built so a typo fails at startup rather
    /// than on the first request.
    fn supports_model(&self, _model: &str) -> bool {
        true
    }
}
