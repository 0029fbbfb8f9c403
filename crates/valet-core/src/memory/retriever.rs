//! Context retrieval: embed a query, search the vector index, and filter
//! the matches down to usable knowledge snippets.

use std::sync::Arc;

use tracing::debug;

use valet_types::error::RetrievalError;
use valet_types::memory::RetrievedChunk;

use crate::memory::{BoxEmbedder, BoxVectorIndex};

/// Retrieves knowledge snippets relevant to a query.
///
/// The pipeline is embed -> vector query -> score filter -> truncate.
/// Callers on the chat path treat failure as "no context" and continue;
/// callers elsewhere propagate the error.
pub struct ContextRetriever {
    embedder: Arc<BoxEmbedder>,
    index: Arc<BoxVectorIndex>,
    top_k: usize,
    min_score: f32,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<BoxEmbedder>,
        index: Arc<BoxVectorIndex>,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
            min_score,
        }
    }

    /// Search the index for snippets relevant to `query`.
    ///
    /// Matches below the score floor are dropped, and at most `top_k`
    /// survivors are returned, best-first. An empty result is a normal
    /// outcome, not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let vectors = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let Some(query_vector) = vectors.into_iter().next() else {
            return Err(RetrievalError::Embedding(
                "embedder returned no vectors".to_string(),
            ));
        };

        let matches = self
            .index
            .query(&query_vector, self.top_k)
            .await
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        let chunks: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter(|m| m.score >= self.min_score)
            .take(self.top_k)
            .map(|m| {
                let text = m
                    .metadata
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let title = m
                    .metadata
                    .get("title")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                let source = m
                    .metadata
                    .get("source")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                RetrievedChunk {
                    content: text,
                    score: m.score,
                    title,
                    source,
                }
            })
            .collect();

        debug!(query_len = query.len(), hits = chunks.len(), "context retrieval");
        Ok(chunks)
    }

    /// Embed `text` and insert or overwrite one knowledge entry.
    ///
    /// Unlike `search` on the chat path, failures here propagate; callers
    /// that index require success.
    pub async fn store(
        &self,
        id: &str,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<(), RetrievalError> {
        let vectors = self
            .embedder
            .embed(&[text.to_string()])
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let Some(vector) = vectors.into_iter().next() else {
            return Err(RetrievalError::Embedding(
                "embedder returned no vectors".to_string(),
            ));
        };
        self.index
            .upsert(id, &vector, metadata)
            .await
            .map_err(|e| RetrievalError::Index(e.to_string()))
    }

    /// Remove entries from the index. Unknown ids are ignored.
    pub async fn remove(&self, ids: &[String]) -> Result<(), RetrievalError> {
        self.index
            .delete_by_ids(ids)
            .await
            .map_err(|e| RetrievalError::Index(e.to_string()))
    }
}
