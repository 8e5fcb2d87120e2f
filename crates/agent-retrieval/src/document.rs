//! Retrieved document

use serde::{Deserialize, Serialize};

/// A document returned by a retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text of the document (or of its relevant extract)
    pub content: String,
    /// Identifier of the source, cited back to the student
    pub source_id: String,
    /// Relevance score, when the collaborator provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Create an unscored document
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_id: source_id.into(),
            score: None,
        }
    }

    /// Set the relevance score
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}
