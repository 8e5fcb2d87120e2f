//! Vertex AI Search retriever
//!
//! Queries a Discovery Engine data store through its default serving
//! config. When an [`Embedder`] is attached, the query embedding is sent
//! along and blended into the ranking expression with the data store's own
//! relevance score.

use super::{GoogleApiClient, discovery_engine_host};
use crate::{Document, Embedder, Result, RetrievalError, Retriever};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

const SERVICE: &str = "Vertex AI Search";

/// Data store coordinates and ranking options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSearchConfig {
    /// Data store identifier
    pub data_store_id: String,
    /// Data store location (`us`, `eu` or `global`)
    pub location: String,
    /// Document field holding the stored embeddings
    pub embedding_field: String,
    /// Weight of the embedding similarity, in [0, 1]
    pub embedding_ratio: f32,
}

impl VertexSearchConfig {
    /// Config for `data_store_id` in `location`
    pub fn new(data_store_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            data_store_id: data_store_id.into(),
            location: location.into(),
            embedding_field: "embedding".to_string(),
            embedding_ratio: 0.5,
        }
    }

    /// Set the embedding field
    pub fn with_embedding_field(mut self, field: impl Into<String>) -> Self {
        self.embedding_field = field.into();
        self
    }

    /// `search` endpoint for `project`
    pub fn search_url(&self, project: &str) -> String {
        format!(
            "https://{host}/v1/projects/{project}/locations/{location}/collections/default_collection/dataStores/{store}/servingConfigs/default_config:search",
            host = discovery_engine_host(&self.location),
            location = self.location,
            store = self.data_store_id,
        )
    }

    /// Ranking expression blending relevance with embedding similarity
    pub fn ranking_expression(&self) -> String {
        format!(
            "{} * dotProduct({}) + {} * relevance_score",
            self.embedding_ratio,
            self.embedding_field,
            1.0 - self.embedding_ratio
        )
    }
}

/// Retriever backed by a Vertex AI Search data store
pub struct VertexSearchRetriever {
    client: GoogleApiClient,
    config: VertexSearchConfig,
    embedder: Option<Arc<dyn Embedder>>,
}

impl VertexSearchRetriever {
    /// Retriever without custom embeddings
    pub fn new(client: GoogleApiClient, config: VertexSearchConfig) -> Self {
        Self {
            client,
            config,
            embedder: None,
        }
    }

    /// Blend query embeddings from `embedder` into the ranking
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Data store config
    pub fn config(&self) -> &VertexSearchConfig {
        &self.config
    }

    async fn build_request(&self, query: &str, max_count: usize) -> Result<SearchRequest> {
        let mut request = SearchRequest {
            query: query.to_string(),
            page_size: max_count,
            content_search_spec: ContentSearchSpec {
                extractive_content_spec: ExtractiveContentSpec {
                    max_extractive_segment_count: 1,
                },
            },
            embedding_spec: None,
            ranking_expression: None,
        };

        if let Some(embedder) = &self.embedder {
            let vector = embedder.embed(query).await?;
            request.embedding_spec = Some(EmbeddingSpec {
                embedding_vectors: vec![EmbeddingVector {
                    field_path: self.config.embedding_field.clone(),
                    vector,
                }],
            });
            request.ranking_expression = Some(self.config.ranking_expression());
        }
        Ok(request)
    }
}

#[async_trait]
impl Retriever for VertexSearchRetriever {
    #[instrument(skip(self), fields(data_store = %self.config.data_store_id))]
    async fn retrieve(&self, query: &str, max_count: usize) -> Result<Vec<Document>> {
        let request = self.build_request(query, max_count).await?;
        let url = self.config.search_url(self.client.project());
        let response: SearchResponse = self.client.post_json(SERVICE, &url, &request).await?;

        let mut documents: Vec<Document> = response.into();
        documents.truncate(max_count);
        debug!(count = documents.len(), "Documents retrieved");
        Ok(documents)
    }
}

impl std::fmt::Debug for VertexSearchRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexSearchRetriever")
            .field("config", &self.config)
            .field("embedder", &self.embedder.is_some())
            .finish_non_exhaustive()
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    query: String,
    page_size: usize,
    content_search_spec: ContentSearchSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding_spec: Option<EmbeddingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranking_expression: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentSearchSpec {
    extractive_content_spec: ExtractiveContentSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractiveContentSpec {
    max_extractive_segment_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSpec {
    embedding_vectors: Vec<EmbeddingVector>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingVector {
    field_path: String,
    vector: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    id: String,
    document: Option<SearchDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    struct_data: Option<Value>,
    #[serde(default)]
    derived_struct_data: Option<Value>,
}

impl SearchResult {
    /// Best available text: extractive segments, then snippets, then the
    /// structured `content` field. Results without any text are skipped.
    fn into_document(self) -> Option<Document> {
        let document = self.document?;
        let derived = document.derived_struct_data.unwrap_or(Value::Null);

        let content = joined(&derived, "extractive_segments", "content")
            .or_else(|| joined(&derived, "snippets", "snippet"))
            .or_else(|| {
                document
                    .struct_data
                    .as_ref()
                    .and_then(|data| data.get("content"))
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            })?;

        let source_id = derived
            .get("link")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .or_else(|| (!document.id.is_empty()).then_some(document.id))
            .unwrap_or(self.id);

        Some(Document::new(source_id, content))
    }
}

fn joined(data: &Value, list: &str, field: &str) -> Option<String> {
    let parts: Vec<&str> = data
        .get(list)?
        .as_array()?
        .iter()
        .filter_map(|item| item.get(field).and_then(Value::as_str))
        .filter(|text| !text.trim().is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

impl From<SearchResponse> for Vec<Document> {
    fn from(response: SearchResponse) -> Self {
        response
            .results
            .into_iter()
            .filter_map(SearchResult::into_document)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockEmbedder;
    use agent_utils::StaticToken;
    use serde_json::json;

    fn retriever() -> VertexSearchRetriever {
        let client =
            GoogleApiClient::new("mon-projet", Arc::new(StaticToken::new("token"))).unwrap();
        VertexSearchRetriever::new(client, VertexSearchConfig::new("mon-agent-scolaire-datastore", "us"))
    }

    #[test]
    fn test_search_url() {
        let config = VertexSearchConfig::new("store", "us");
        assert_eq!(
            config.search_url("p"),
            "https://us-discoveryengine.googleapis.com/v1/projects/p/locations/us/collections/default_collection/dataStores/store/servingConfigs/default_config:search"
        );
        assert_eq!(
            config.ranking_expression(),
            "0.5 * dotProduct(embedding) + 0.5 * relevance_score"
        );
    }

    #[test]
    fn test_request_without_embedder() {
        let request = tokio_test::block_on(retriever().build_request("fractions", 10)).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["query"], "fractions");
        assert_eq!(body["pageSize"], 10);
        assert!(body.get("embeddingSpec").is_none());
        assert!(body.get("rankingExpression").is_none());
    }

    #[test]
    fn test_request_with_embedder() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .withf(|text| text.contains("photosynthèse"))
            .times(1)
            .returning(|_| Ok(vec![0.25, -0.5]));

        let retriever = retriever().with_embedder(Arc::new(embedder));
        let request = tokio_test::block_on(retriever.build_request("photosynthèse", 5)).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["embeddingSpec"]["embeddingVectors"][0]["fieldPath"], "embedding");
        assert_eq!(body["embeddingSpec"]["embeddingVectors"][0]["vector"], json!([0.25, -0.5]));
        assert_eq!(
            body["rankingExpression"],
            "0.5 * dotProduct(embedding) + 0.5 * relevance_score"
        );
    }

    #[test]
    fn test_embedder_failure_propagates() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .returning(|_| Err(RetrievalError::Timeout("embedding".into())));

        let retriever = retriever().with_embedder(Arc::new(embedder));
        let err = tokio_test::block_on(retriever.build_request("q", 5)).unwrap_err();
        assert_eq!(err.kind(), "TimeoutError");
    }

    #[test]
    fn test_response_parsing() {
        let response: SearchResponse = serde_json::from_value(json!({
            "results": [
                {
                    "id": "r1",
                    "document": {
                        "id": "svt-5e",
                        "derivedStructData": {
                            "link": "gs://cours/svt-5e.pdf",
                            "extractive_segments": [
                                {"content": "La photosynthèse produit du glucose."},
                                {"content": "Elle libère du dioxygène."}
                            ]
                        }
                    }
                },
                {
                    "id": "r2",
                    "document": {
                        "id": "maths-6e",
                        "structData": {"content": "Une fraction est un quotient."}
                    }
                },
                {
                    "id": "r3",
                    "document": {"id": "vide", "derivedStructData": {}}
                }
            ]
        }))
        .unwrap();

        let documents: Vec<Document> = response.into();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_id, "gs://cours/svt-5e.pdf");
        assert_eq!(
            documents[0].content,
            "La photosynthèse produit du glucose.\nElle libère du dioxygène."
        );
        assert_eq!(documents[1].source_id, "maths-6e");
    }

    #[test]
    fn test_empty_response() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        let documents: Vec<Document> = response.into();
        assert!(documents.is_empty());
    }
}
