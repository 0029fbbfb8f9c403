//! Runtime configuration for Valet.
//!
//! [`ValetConfig`] is deserialized from `{data_dir}/config.toml` by the
//! infra loader; every field has a default so a missing or partial file
//! still yields a working configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValetConfig {
    /// Number of pooled session actors.
    pub pool_size: usize,
    /// User-message count between compactions (window size W).
    pub compaction_window: u32,
    /// Raw turns fetched for prompt context (K).
    pub recent_turns: u32,
    /// Maximum knowledge snippets injected per reply.
    pub retrieval_top_k: usize,
    /// Minimum similarity score for a retrieved snippet.
    pub retrieval_min_score: f32,
    /// Model for chat completions.
    pub chat_model: String,
    /// Model for summary generation during compaction.
    pub summary_model: String,
    /// Model for query/fact embeddings.
    pub embedding_model: String,
    /// Dimensionality of the embedding model's vectors.
    pub embedding_dimension: usize,
    /// Base URL of the inference collaborator.
    pub ai_endpoint: String,
    /// Base URL of the vector index collaborator.
    pub vector_endpoint: String,
}

impl Default for ValetConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            compaction_window: 5,
            recent_turns: 3,
            retrieval_top_k: 5,
            retrieval_min_score: 0.75,
            chat_model: "@cf/meta/llama-3.1-8b-instruct".to_string(),
            summary_model: "@cf/qwen/qwen1.5-0.5b-chat".to_string(),
            embedding_model: "@cf/baai/bge-base-en-v1.5".to_string(),
            embedding_dimension: 768,
            ai_endpoint: "http://127.0.0.1:8787".to_string(),
            vector_endpoint: "http://127.0.0.1:8788".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design_values() {
        let config = ValetConfig::default();
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.compaction_window, 5);
        assert_eq!(config.recent_turns, 3);
        assert_eq!(config.retrieval_top_k, 5);
        assert!((config.retrieval_min_score - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: ValetConfig = toml::from_str("pool_size = 4").unwrap();
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.compaction_window, 5);
        assert_eq!(config.embedding_dimension, 768);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: ValetConfig = toml::from_str("").unwrap();
        assert_eq!(config.pool_size, ValetConfig::default().pool_size);
    }
}
