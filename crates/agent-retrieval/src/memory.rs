//! In-process collaborators for tests and offline runs

use crate::{Document, Reranker, RetrievalError, Result, Retriever};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Keyword retriever over a fixed corpus
///
/// A document's score is the number of query terms (three letters or more,
/// case-insensitive) found in its content. Unmatched documents are dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    documents: Vec<Document>,
}

impl InMemoryRetriever {
    /// Retriever over `documents`
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load a JSON array of `{ "source_id", "content" }` objects
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Configuration(format!("cannot read corpus {}: {e}", path.display()))
        })?;
        let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
            RetrievalError::Configuration(format!("invalid corpus {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), documents = documents.len(), "Corpus loaded");
        Ok(Self::new(documents))
    }

    /// Number of documents in the corpus
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve(&self, query: &str, max_count: usize) -> Result<Vec<Document>> {
        let query_terms = terms(query);
        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let content = terms(&doc.content);
                let hits = query_terms.iter().filter(|t| content.contains(t)).count();
                (hits, doc)
            })
            .filter(|(hits, _)| *hits > 0)
            .collect();

        // Stable: ties keep corpus order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(max_count)
            .map(|(hits, doc)| {
                #[allow(clippy::cast_precision_loss)]
                let score = hits as f32;
                doc.clone().with_score(score)
            })
            .collect())
    }
}

/// Reranker that keeps the retriever's order
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReranker;

#[async_trait]
impl Reranker for IdentityReranker {
    async fn rerank(&self, documents: Vec<Document>, _query: &str) -> Result<Vec<Document>> {
        Ok(documents)
    }
}
