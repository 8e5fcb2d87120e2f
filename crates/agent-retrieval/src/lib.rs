//! Document retrieval for the tutoring agents
//!
//! The `retrieve_docs` tool chains two external collaborators, a
//! [`Retriever`] and a [`Reranker`], and formats what survives into a text
//! block for the model. Concrete collaborators talk to Vertex AI Search and
//! the Vertex AI Ranking API; in-memory ones serve tests and offline runs.

pub mod document;
pub mod error;
pub mod format;
pub mod memory;
pub mod retry;
pub mod tool;
pub mod traits;
pub mod vertex;

pub use document::Document;
pub use error::{RetrievalError, Result};
pub use format::{DOCS_TEMPLATE, DOCS_TEMPLATE_NAME, DocumentFormatter};
pub use memory::{IdentityReranker, InMemoryRetriever};
pub use retry::RetryPolicy;
pub use tool::{DEFAULT_MAX_DOCUMENTS, RETRIEVE_DOCS, RetrieveDocsTool, error_text};
pub use traits::{Embedder, Reranker, Retriever};
pub use vertex::{
    GoogleApiClient, VertexEmbedder, VertexRankReranker, VertexSearchConfig, VertexSearchRetriever,
};
