//! Error taxonomy for the Valet core.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in valet-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from a single session actor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Claim race lost: the actor is already bound to a session. The caller
    /// retries against a different slot, never against this one.
    #[error("actor busy")]
    ActorBusy,

    /// Lifecycle transition attempted out of order.
    #[error("invalid actor state: expected {expected}")]
    InvalidState { expected: &'static str },
}

/// Errors from the session pool manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is claimed. Surfaced to the user as a retryable "busy"
    /// condition; there is no backlog or wait-list.
    #[error("no session actor available")]
    NoneAvailable,
}

/// Errors from context retrieval. Non-fatal on the chat path, which
/// degrades to prompt assembly without retrieved knowledge.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(String),

    #[error("vector index query failed: {0}")]
    Index(String),
}

/// Errors inside the compaction pipeline. Always logged and swallowed at
/// the task boundary; the next window boundary is the natural retry.
#[derive(Debug, Error)]
pub enum CompactionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Errors from the reply pipeline. Fatal to the current turn only; the
/// session stays active and the client receives an apologetic frame.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn session_error_display() {
        assert_eq!(SessionError::ActorBusy.to_string(), "actor busy");
    }

    #[test]
    fn engine_error_wraps_llm() {
        let err: EngineError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
    }
}
