//! VectorizeClient -- [`VectorIndex`] implementation for a Vectorize-style
//! HTTP index.
//!
//! The index is a shared, externally-synchronized resource; this client is
//! a thin JSON shim over `query`, `upsert`, and `delete_by_ids` with bearer
//! authentication.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use valet_core::memory::{VectorIndex, VectorMatch};
use valet_types::error::RepositoryError;

/// HTTP client for the vector index.
pub struct VectorizeClient {
    client: reqwest::Client,
    api_token: SecretString,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f32],
    top_k: usize,
    return_metadata: bool,
}

#[derive(Deserialize)]
struct QueryEnvelope {
    matches: Vec<MatchRow>,
}

#[derive(Deserialize)]
struct MatchRow {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Value,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Value,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    ids: &'a [String],
}

impl VectorizeClient {
    pub fn new(base_url: String, api_token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_token,
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, RepositoryError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.api_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Query(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Query(format!(
                "vector index HTTP {status}: {error_body}"
            )));
        }
        Ok(response)
    }
}

impl VectorIndex for VectorizeClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, RepositoryError> {
        let body = QueryBody {
            vector,
            top_k,
            return_metadata: true,
        };
        let response = self.post_json("/query", &body).await?;

        let envelope: QueryEnvelope = response
            .json()
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to parse matches: {e}")))?;

        Ok(envelope
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }

    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: Value,
    ) -> Result<(), RepositoryError> {
        let body = UpsertBody {
            vectors: vec![UpsertVector {
                id,
                values: vector,
                metadata,
            }],
        };
        self.post_json("/upsert", &body).await?;
        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), RepositoryError> {
        let body = DeleteBody { ids };
        self.post_json("/delete_by_ids", &body).await?;
        Ok(())
    }
}
