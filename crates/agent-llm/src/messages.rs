//! Conversation message types
//!
//! A conversation alternates between the user (the question, then tool
//! results) and the assistant (text answers and tool call requests).
//! The system instruction is carried on the request, not as a message.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message (also carries tool results)
    User,
    /// Assistant message
    Assistant,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool call requested by the assistant
    ToolUse {
        /// Unique ID for this call within the turn
        id: String,
        /// Tool name
        name: String,
        /// Arguments (JSON object)
        input: serde_json::Value,
    },

    /// Result of a tool call, sent back by the user side
    ToolResult {
        /// ID of the call this answers
        tool_use_id: String,
        /// Name of the tool that produced the result
        name: String,
        /// Result content
        content: String,
        /// Whether this is an error result
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Successful tool result block
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Failed tool result block
    pub fn tool_error(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            content: error.into(),
            is_error: true,
        }
    }
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A tool call extracted from an assistant message
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Call ID, echoed back in the matching result
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments as sent by the model
    pub input: serde_json::Value,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message from content blocks
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(blocks)),
        }
    }

    /// Create a user message with a single tool result
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::tool_results(vec![ContentBlock::tool_result(tool_use_id, name, result)])
    }

    /// Create a user message with a single error tool result
    pub fn tool_error(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::tool_results(vec![ContentBlock::tool_error(tool_use_id, name, error)])
    }

    /// Create a user message answering every call of the previous turn
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(results)),
        }
    }

    /// Text content of the message
    ///
    /// Text blocks are joined in order; `None` when the message has no text.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.concat())
                }
            }
            None => None,
        }
    }

    /// Tool calls requested by an assistant message, in order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    }),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Check if this message contains any tool calls
    pub fn has_tool_calls(&self) -> bool {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. })),
            _ => false,
        }
    }

    /// Tool result blocks carried by this message
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ContentBlock> {
        let blocks: &[ContentBlock] = match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        };
        blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::ToolResult { .. }))
    }
}
