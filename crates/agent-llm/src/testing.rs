//! Scripted in-process backend for deterministic tests
//!
//! [`ScriptedProvider`] answers each request with a closure, so a test can
//! decide what the "model" does from the instruction, the manifest, and the
//! conversation so far. Every request is recorded for later assertions.

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync>;

/// Completion backend driven by a closure
pub struct ScriptedProvider {
    responder: Responder,
    supported_models: Option<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Answer every request with `respond`
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&CompletionRequest) -> CompletionResponse + Send + Sync + 'static,
    {
        Self::fallible(move |request| Ok(respond(request)))
    }

    /// Answer every request with `respond`, which may fail
    pub fn fallible<F>(respond: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(respond),
            supported_models: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same final text
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| text_response(text.clone()))
    }

    /// Restrict the accepted model identifiers
    pub fn with_supported_models(mut self, models: &[&str]) -> Self {
        self.supported_models = Some(models.iter().map(ToString::to_string).collect());
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = (self.responder)(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        response
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports_model(&self, model: &str) -> bool {
        self.supported_models
            .as_ref()
            .is_none_or(|models| models.iter().any(|m| m == model))
    }
}

/// A final answer
pub fn text_response(text: impl Into<String>) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

/// A turn requesting the given tool calls, in order
pub fn tool_call_response<N: Into<String>>(calls: Vec<(N, Value)>) -> CompletionResponse {
    let blocks = calls
        .into_iter()
        .enumerate()
        .map(|(i, (name, input))| ContentBlock::ToolUse {
            id: format!("call_{i}"),
            name: name.into(),
            input,
        })
        .collect();
    CompletionResponse {
        message: Message::assistant_blocks(blocks),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
    }
}

/// `(tool name, content, is_error)` of the results in the last message
pub fn last_tool_results(request: &CompletionRequest) -> Vec<(String, String, bool)> {
    request
        .messages
        .last()
        .map(|m| {
            m.tool_results_iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult {
                        name,
                        content,
                        is_error,
                        ..
                    } => Some((name.clone(), content.clone(), *is_error)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_provider_records_requests() {
        let provider = ScriptedProvider::new(|request| {
            if request.is_tool_followup() {
                text_response("fini")
            } else {
                tool_call_response(vec![("retrieve_docs", json!({"query": "q"}))])
            }
        })
        .with_supported_models(&["gemini-2.0-flash"]);

        assert!(provider.supports_model("gemini-2.0-flash"));
        assert!(!provider.supports_model("other"));

        let first = provider
            .complete(
                CompletionRequest::builder("gemini-2.0-flash")
                    .add_message(Message::user("q"))
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(first.stop_reason, StopReason::ToolUse);

        let followup = CompletionRequest::builder("gemini-2.0-flash")
            .add_message(Message::user("q"))
            .add_message(first.message)
            .add_message(Message::tool_result("call_0", "retrieve_docs", "docs"))
            .build();
        assert_eq!(
            last_tool_results(&followup),
            vec![("retrieve_docs".to_string(), "docs".to_string(), false)]
        );

        let second = provider.complete(followup).await.unwrap();
        assert_eq!(second.message.text().as_deref(), Some("fini"));
        assert_eq!(provider.call_count(), 2);
    }
}
