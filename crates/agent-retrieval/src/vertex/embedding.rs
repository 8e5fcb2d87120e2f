//! Vertex AI text embeddings

use super::GoogleApiClient;
use crate::{Embedder, Result, RetrievalError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const SERVICE: &str = "Vertex AI Embeddings";

/// Embedding model used unless overridden
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-005";

/// Query embedder backed by a Vertex AI publisher model
#[derive(Debug)]
pub struct VertexEmbedder {
    client: GoogleApiClient,
    location: String,
    model: String,
}

impl VertexEmbedder {
    /// Embedder for `model` in `location`
    pub fn new(client: GoogleApiClient, location: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            location: location.into(),
            model: model.into(),
        }
    }

    /// Model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// `predict` endpoint
    pub fn predict_url(&self) -> String {
        format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict",
            location = self.location,
            project = self.client.project(),
            model = self.model,
        )
    }
}

#[async_trait]
impl Embedder for VertexEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = PredictRequest {
            instances: vec![Instance {
                content: text.to_string(),
                task_type: "RETRIEVAL_QUERY",
            }],
        };
        let response: PredictResponse = self
            .client
            .post_json(SERVICE, &self.predict_url(), &request)
            .await?;
        response.into_vector()
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
}

#[derive(Debug, Serialize)]
struct Instance {
    content: String,
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    embeddings: Embeddings,
}

#[derive(Debug, Deserialize)]
struct Embeddings {
    values: Vec<f32>,
}

impl PredictResponse {
    fn into_vector(self) -> Result<Vec<f32>> {
        self.predictions
            .into_iter()
            .next()
            .map(|p| p.embeddings.values)
            .filter(|values| !values.is_empty())
            .ok_or_else(|| RetrievalError::InvalidResponse(format!("{SERVICE}: no embedding returned")))
    }
}
