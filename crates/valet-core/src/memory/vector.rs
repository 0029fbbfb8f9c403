//! Vector index collaborator trait.
//!
//! Defines the interface consumed from the external vector index: nearest
//! neighbor queries, upserts, and deletes. The index's storage engine is
//! out of scope; implementations in valet-infra are thin HTTP clients.

use serde_json::Value;

use valet_types::error::RepositoryError;

/// A single nearest-neighbor match from the index.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

/// Trait for the external vector index.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition). The index is
/// a shared, externally-synchronized resource; no exclusive access is
/// assumed and concurrent writers across sessions must be tolerated.
pub trait VectorIndex: Send + Sync {
    /// Query the index for the `top_k` nearest neighbors of `vector`,
    /// ordered by descending score.
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<VectorMatch>, RepositoryError>> + Send;

    /// Insert or overwrite one vector with its metadata.
    fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: Value,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete vectors by id. Unknown ids are ignored.
    fn delete_by_ids(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
