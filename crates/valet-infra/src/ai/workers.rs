//! WorkersAiClient -- [`LlmProvider`] and [`Embedder`] implementation for a
//! Workers-AI-compatible gateway.
//!
//! Sends requests to `{endpoint}/ai/run/{model}` with bearer authentication.
//! One client serves both chat completions and embeddings; the model id in
//! the path selects the task.
//!
//! The API token is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use valet_core::llm::LlmProvider;
use valet_core::memory::Embedder;
use valet_types::error::RepositoryError;
use valet_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Workers AI gateway client.
pub struct WorkersAiClient {
    client: reqwest::Client,
    api_token: SecretString,
    base_url: String,
    embedding_model: String,
    embedding_dimension: usize,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    messages: &'a [valet_types::llm::Message],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    result: ChatResult,
}

#[derive(Deserialize)]
struct ChatResult {
    response: String,
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    text: &'a [String],
}

#[derive(Deserialize)]
struct EmbedEnvelope {
    result: EmbedResult,
}

#[derive(Deserialize)]
struct EmbedResult {
    data: Vec<Vec<f32>>,
}

impl WorkersAiClient {
    /// Create a new gateway client.
    pub fn new(
        base_url: String,
        api_token: SecretString,
        embedding_model: String,
        embedding_dimension: usize,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_token,
            base_url,
            embedding_model,
            embedding_dimension,
        }
    }

    fn run_url(&self, model: &str) -> String {
        format!("{}/ai/run/{model}", self.base_url.trim_end_matches('/'))
    }

    async fn post_json<B: Serialize>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(self.run_url(model))
            .bearer_auth(self.api_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                400 => LlmError::InvalidRequest(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }
        Ok(response)
    }
}

// WorkersAiClient intentionally does NOT derive Debug; the SecretString
// field keeps the token out of logs, and omitting Debug removes the
// temptation entirely.

impl LlmProvider for WorkersAiClient {
    fn name(&self) -> &str {
        "workers-ai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatBody {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let response = self.post_json(&request.model, &body).await?;

        let envelope: ChatEnvelope = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(CompletionResponse {
            content: envelope.result.response,
            model: request.model.clone(),
        })
    }
}

impl Embedder for WorkersAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        let body = EmbedBody { text: texts };
        let response = self
            .post_json(&self.embedding_model, &body)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let envelope: EmbedEnvelope = response
            .json()
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to parse embeddings: {e}")))?;

        if envelope.result.data.len() != texts.len() {
            return Err(RepositoryError::Query(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                envelope.result.data.len()
            )));
        }
        Ok(envelope.result.data)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> WorkersAiClient {
        WorkersAiClient::new(
            base_url.to_string(),
            SecretString::from("test-token"),
            "@cf/baai/bge-base-en-v1.5".to_string(),
            768,
        )
    }

    #[test]
    fn run_url_joins_without_double_slash() {
        let c = client("http://localhost:8787/");
        assert_eq!(
            c.run_url("@cf/meta/llama-3.1-8b-instruct"),
            "http://localhost:8787/ai/run/@cf/meta/llama-3.1-8b-instruct"
        );
    }

    #[test]
    fn embedder_reports_configured_model() {
        let c = client("http://localhost:8787");
        assert_eq!(c.model_name(), "@cf/baai/bge-base-en-v1.5");
        assert_eq!(c.dimension(), 768);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_provider_error() {
        let c = client("http://127.0.0.1:1");
        let request = CompletionRequest {
            model: "@cf/meta/llama-3.1-8b-instruct".to_string(),
            messages: vec![valet_types::llm::Message::user("hi")],
            max_tokens: 16,
            temperature: None,
        };
        let err = c.complete(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
    }
}
