//! Embedder trait for text-to-vector conversion.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations live in valet-infra.

use valet_types::error::RepositoryError;

/// Trait for converting text into embedding vectors.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors. Returns one vector per input
    /// text; batching is supported for efficiency.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send;

    /// The model name used for embeddings.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
