//! Vertex AI Ranking API reranker

use super::{GoogleApiClient, discovery_engine_host};
use crate::{Document, Reranker, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SERVICE: &str = "Vertex AI Ranking";

/// Semantic ranker used unless overridden
pub const DEFAULT_RANKING_MODEL: &str = "semantic-ranker-512@latest";

/// Documents kept after reranking unless overridden
pub const DEFAULT_TOP_N: usize = 5;

/// Reranker backed by the Ranking API's default ranking config
#[derive(Debug)]
pub struct VertexRankReranker {
    client: GoogleApiClient,
    location: String,
    model: String,
    top_n: usize,
}

impl VertexRankReranker {
    /// Reranker in the `global` location with the default model
    pub fn new(client: GoogleApiClient) -> Self {
        Self {
            client,
            location: "global".to_string(),
            model: DEFAULT_RANKING_MODEL.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Set the ranking model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set how many documents survive
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    /// `rank` endpoint
    pub fn rank_url(&self) -> String {
        format!(
            "https://{host}/v1/projects/{project}/locations/{location}/rankingConfigs/default_ranking_config:rank",
            host = discovery_engine_host(&self.location),
            project = self.client.project(),
            location = self.location,
        )
    }

    fn build_request(&self, documents: &[Document], query: &str) -> RankRequest {
        RankRequest {
            model: self.model.clone(),
            query: query.to_string(),
            top_n: self.top_n,
            records: documents
                .iter()
                .enumerate()
                .map(|(index, doc)| RankRecord {
                    id: index.to_string(),
                    title: doc.source_id.clone(),
                    content: doc.content.clone(),
                })
                .collect(),
        }
    }
}

/// Keep the ranked records that map back to an input document, in the
/// service's order, carrying the service's score
fn apply_ranking(mut documents: Vec<Document>, ranked: Vec<RankedRecord>) -> Vec<Document> {
    let mut slots: Vec<Option<Document>> = documents.drain(..).map(Some).collect();
    ranked
        .into_iter()
        .filter_map(|record| {
            let index: usize = record.id.parse().ok()?;
            let doc = slots.get_mut(index)?.take()?;
            Some(match record.score {
                Some(score) => doc.with_score(score),
                None => doc,
            })
        })
        .collect()
}

#[async_trait]
impl Reranker for VertexRankReranker {
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn rerank(&self, documents: Vec<Document>, query: &str) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }

        let request = self.build_request(&documents, query);
        let response: RankResponse = self
            .client
            .post_json(SERVICE, &self.rank_url(), &request)
            .await?;

        let ranked = apply_ranking(documents, response.records);
        debug!(kept = ranked.len(), "Documents reranked");
        Ok(ranked)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RankRequest {
    model: String,
    query: String,
    top_n: usize,
    records: Vec<RankRecord>,
}

#[derive(Debug, Serialize)]
struct RankRecord {
    id: String,
    title: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RankResponse {
    #[serde(default)]
    records: Vec<RankedRecord>,
}

#[derive(Debug, Deserialize)]
struct RankedRecord {
    id: String,
    #[serde(default)]
    score: Option<f32>,
}
