//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.
//!
//! Follows the same blanket-impl pattern as BoxLlmProvider and BoxEmbedder.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use valet_types::error::RepositoryError;

use super::vector::{VectorIndex, VectorMatch};

/// Object-safe version of [`VectorIndex`] with boxed futures.
pub trait VectorIndexDyn: Send + Sync {
    fn query_boxed<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VectorMatch>, RepositoryError>> + Send + 'a>>;

    fn upsert_boxed<'a>(
        &'a self,
        id: &'a str,
        vector: &'a [f32],
        metadata: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;

    fn delete_by_ids_boxed<'a>(
        &'a self,
        ids: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;
}

impl<T: VectorIndex> VectorIndexDyn for T {
    fn query_boxed<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VectorMatch>, RepositoryError>> + Send + 'a>> {
        Box::pin(self.query(vector, top_k))
    }

    fn upsert_boxed<'a>(
        &'a self,
        id: &'a str,
        vector: &'a [f32],
        metadata: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        Box::pin(self.upsert(id, vector, metadata))
    }

    fn delete_by_ids_boxed<'a>(
        &'a self,
        ids: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        Box::pin(self.delete_by_ids(ids))
    }
}

/// Type-erased vector index client.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    /// Wrap a concrete `VectorIndex` in a type-erased box.
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    pub async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, RepositoryError> {
        self.inner.query_boxed(vector, top_k).await
    }

    pub async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: Value,
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_boxed(id, vector, metadata).await
    }

    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<(), RepositoryError> {
        self.inner.delete_by_ids_boxed(ids).await
    }
}
