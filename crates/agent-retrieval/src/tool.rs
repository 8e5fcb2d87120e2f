//! The `retrieve_docs` tool
//!
//! Retrieval, reranking and formatting happen in [`RetrieveDocsTool::search`],
//! which returns a typed error. Only the [`Tool`] implementation turns that
//! error into text, so the calling agent always gets something to read.

use crate::{Document, DocumentFormatter, Reranker, Result, RetrievalError, Retriever, RetryPolicy};
use agent_core::Context;
use agent_llm::tools::schema;
use agent_tools::{Tool, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Tool name seen by the model
pub const RETRIEVE_DOCS: &str = "retrieve_docs";

/// Documents requested from the retriever unless overridden
pub const DEFAULT_MAX_DOCUMENTS: usize = 10;

const QUERY_ARG: &str = "query";

const DESCRIPTION: &str = "Recherche des documents pertinents dans la base documentaire scolaire \
     et renvoie leur contenu avec leurs sources.";

/// Text handed to the model when a search fails
pub fn error_text(err: &RetrievalError) -> String {
    format!(
        "Erreur lors de la recherche documentaire:\n\n{}: {}",
        err.kind(),
        err
    )
}

/// Document search exposed as a tool
pub struct RetrieveDocsTool {
    retriever: Arc<dyn Retriever>,
    reranker: Arc<dyn Reranker>,
    formatter: DocumentFormatter,
    max_documents: usize,
    retry: RetryPolicy,
}

impl RetrieveDocsTool {
    /// Tool over `retriever` and `reranker`
    pub fn new(
        retriever: Arc<dyn Retriever>,
        reranker: Arc<dyn Reranker>,
        formatter: DocumentFormatter,
    ) -> Self {
        Self {
            retriever,
            reranker,
            formatter,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            retry: RetryPolicy::default(),
        }
    }

    /// Set how many documents the retriever is asked for
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = max_documents.max(1);
        self
    }

    /// Set the retry policy applied to each collaborator call
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Documents requested per search
    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    /// Retrieve, rerank and format documents for `query`
    #[instrument(skip(self), fields(max_documents = self.max_documents))]
    pub async fn search(&self, query: &str) -> Result<String> {
        let retriever = &self.retriever;
        let max_documents = self.max_documents;
        let retrieved = self
            .retry
            .execute("retrieve", move || retriever.retrieve(query, max_documents))
            .await?;
        let retrieved_count = retrieved.len();

        let ranked: Vec<Document> = if retrieved.is_empty() {
            retrieved
        } else {
            let reranker = &self.reranker;
            self.retry
                .execute("rerank", move || reranker.rerank(retrieved.clone(), query))
                .await?
        };

        info!(retrieved = retrieved_count, kept = ranked.len(), "Document search done");
        self.formatter.format(&ranked)
    }
}

#[async_trait]
impl Tool for RetrieveDocsTool {
    async fn execute(&self, params: Value, _context: &Context) -> agent_core::Result<ToolOutput> {
        let outcome = match params.get(QUERY_ARG).and_then(Value::as_str) {
            Some(query) => self.search(query).await,
            None => Err(RetrievalError::InvalidQuery(format!(
                "missing string argument '{QUERY_ARG}'"
            ))),
        };

        let text = outcome.unwrap_or_else(|err| {
            warn!(kind = err.kind(), error = %err, "Document search failed");
            error_text(&err)
        });
        Ok(ToolOutput::from(text))
    }

    fn name(&self) -> &str {
        RETRIEVE_DOCS
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        schema::single_string(QUERY_ARG, "La question ou les mots-clés à rechercher")
    }
}

impl std::fmt::Debug for RetrieveDocsTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieveDocsTool")
            .field("formatter", &self.formatter)
            .field("max_documents", &self.max_documents)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockReranker, MockRetriever};
    use crate::{IdentityReranker, InMemoryRetriever};
    use serde_json::json;

    fn formatter() -> DocumentFormatter {
        DocumentFormatter::builtin().unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_then_rerank_then_format() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .withf(|query, max| query.contains("photosynthèse") && *max == 3)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    Document::new("svt-1", "Les feuilles captent la lumière."),
                    Document::new("svt-2", "La photosynthèse produit du glucose."),
                ])
            });

        let mut reranker = MockReranker::new();
        reranker
            .expect_rerank()
            .times(1)
            .returning(|mut docs, _| {
                docs.reverse();
                Ok(docs)
            });

        let tool = RetrieveDocsTool::new(Arc::new(retriever), Arc::new(reranker), formatter())
            .with_max_documents(3);
        let text = tool.search("photosynthèse").await.unwrap();

        let first = text.find("Source: svt-2").unwrap();
        let second = text.find("Source: svt-1").unwrap();
        assert!(first < second);
        assert!(text.contains("<Document 0>\nSource: svt-2"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_not_an_error() {
        let mut retriever = MockRetriever::new();
        retriever.expect_retrieve().returning(|_, _| Ok(Vec::new()));
        let mut reranker = MockReranker::new();
        reranker.expect_rerank().never();

        let tool = RetrieveDocsTool::new(Arc::new(retriever), Arc::new(reranker), formatter());
        let output = tool
            .execute(json!({"query": "volcans"}), &Context::new())
            .await
            .unwrap();

        let text = output.text();
        assert!(text.starts_with("## Context provided:"));
        assert!(!text.contains("<Document"));
        assert!(!text.contains("Erreur"));
    }

    #[tokio::test]
    async fn test_failing_retriever_becomes_text() {
        let mut retriever = MockRetriever::new();
        retriever.expect_retrieve().times(1).returning(|_, _| {
            Err(RetrievalError::Http {
                service: "Vertex AI Search".into(),
                status: 403,
                body: "permission denied".into(),
            })
        });

        let tool = RetrieveDocsTool::new(Arc::new(retriever), Arc::new(IdentityReranker), formatter())
            .with_retry_policy(RetryPolicy::fast());
        let output = tool
            .execute(json!({"query": "fractions"}), &Context::new())
            .await
            .unwrap();

        assert_eq!(
            output.text(),
            "Erreur lors de la recherche documentaire:\n\nHttpError: Vertex AI Search returned HTTP 403: permission denied"
        );
    }

    #[tokio::test]
    async fn test_transient_reranker_failure_retried() {
        let mut reranker = MockReranker::new();
        let mut seq = mockall::Sequence::new();
        reranker
            .expect_rerank()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RetrievalError::Timeout("rank timed out".into())));
        reranker
            .expect_rerank()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|docs, _| Ok(docs));

        let retriever = InMemoryRetriever::new(vec![Document::new("maths-1", "Les fractions simplifiées")]);
        let tool = RetrieveDocsTool::new(Arc::new(retriever), Arc::new(reranker), formatter())
            .with_retry_policy(RetryPolicy::fast());

        let text = tool.search("fractions").await.unwrap();
        assert!(text.contains("Source: maths-1"));
    }

    #[tokio::test]
    async fn test_missing_query_argument() {
        let tool = RetrieveDocsTool::new(
            Arc::new(InMemoryRetriever::default()),
            Arc::new(IdentityReranker),
            formatter(),
        );
        let output = tool.execute(json!({"q": 1}), &Context::new()).await.unwrap();
        assert!(output.text().starts_with("Erreur lors de la recherche documentaire:\n\nInvalidQueryError"));
    }

    #[test]
    fn test_tool_surface() {
        let tool = RetrieveDocsTool::new(
            Arc::new(InMemoryRetriever::default()),
            Arc::new(IdentityReranker),
            formatter(),
        );
        assert_eq!(tool.name(), "retrieve_docs");
        assert_eq!(tool.input_schema()["required"][0], "query");
        assert_eq!(tool.max_documents(), DEFAULT_MAX_DOCUMENTS);
    }
}
