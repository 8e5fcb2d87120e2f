//! External collaborator contracts

use crate::{Document, Result};
use async_trait::async_trait;

/// Finds documents relevant to a query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `max_count` documents, most relevant first
    async fn retrieve(&self, query: &str, max_count: usize) -> Result<Vec<Document>>;
}

/// Reorders and filters retrieved documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reranker: Send + Sync {
    /// An ordered subsequence of `documents`
    async fn rerank(&self, documents: Vec<Document>, query: &str) -> Result<Vec<Document>>;
}

/// Maps text to a fixed-length vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding of `text` as a search query
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
