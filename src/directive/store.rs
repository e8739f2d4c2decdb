//! DirectiveStore trait, the abstract interface for the passage index.
//!
//! The primary implementation is `SqliteDirectiveStore` in the `sqlite`
//! module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// An indexed directive passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPassage {
    /// Unique passage identifier.
    pub passage_id: String,
    /// The text content of the passage.
    pub content: String,
    /// Source label (document + page).
    pub source: String,
    /// Chunk index within the source.
    pub chunk_index: usize,
    /// Character offset within the source.
    pub start_offset: usize,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageMatch {
    pub passage: StoredPassage,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Metadata recorded after an ingestion run; used to decide whether the
/// index must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestMeta {
    /// SHA-256 of the directive PDF bytes.
    pub fingerprint: String,
    /// Embedding model the vectors were produced with.
    pub embedding_model: String,
}

#[async_trait]
pub trait DirectiveStore: Send + Sync {
    /// Append passages with their embedding vectors.
    async fn insert_batch(
        &self,
        items: Vec<(StoredPassage, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Top-`limit` passages by cosine similarity to the query embedding.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<PassageMatch>, ApiError>;

    /// Total indexed passage count.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Delete all passages (meta is kept until the next `record_ingest`).
    async fn clear(&self) -> Result<usize, ApiError>;

    /// Ingestion metadata from the last completed run, if any.
    async fn ingest_meta(&self) -> Result<Option<IngestMeta>, ApiError>;

    /// Record a completed ingestion run.
    async fn record_ingest(&self, meta: &IngestMeta) -> Result<(), ApiError>;
}
