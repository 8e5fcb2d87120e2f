//! Google Cloud collaborators
//!
//! Vertex AI Search (Discovery Engine) for retrieval, the Vertex AI Ranking
//! API for reranking, and the text embedding model that feeds the search's
//! custom-embedding ranking expression.

mod client;
pub mod embedding;
pub mod rank;
pub mod search;

pub use client::GoogleApiClient;
pub use embedding::{DEFAULT_EMBEDDING_MODEL, VertexEmbedder};
pub use rank::{DEFAULT_RANKING_MODEL, VertexRankReranker};
pub use search::{VertexSearchConfig, VertexSearchRetriever};

/// Discovery Engine host serving `location`
pub(crate) fn discovery_engine_host(location: &str) -> String {
    if location == "global" {
        "discoveryengine.googleapis.com".to_string()
    } else {
        format!("{location}-discoveryengine.googleapis.com")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_engine_host() {
        assert_eq!(discovery_engine_host("global"), "discoveryengine.googleapis.com");
        assert_eq!(discovery_engine_host("us"), "us-discoveryengine.googleapis.com");
        assert_eq!(discovery_engine_host("eu"), "eu-discoveryengine.googleapis.com");
    }
}
