//! LlmProvider trait definition.
//!
//! The core abstraction over the inference collaborator. Uses RPITIT
//! (native async fn in traits, Rust 2024 edition); implementations live
//! in valet-infra.

use valet_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for inference backends.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "workers-ai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
