//! Persistence contract for conversation history.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations live in valet-infra.

use valet_types::chat::{RollingSummary, StoreStats, Turn};
use valet_types::error::RepositoryError;

/// Repository for turns, rolling summaries, and session statistics.
///
/// The store is a shared, externally-synchronized resource: concurrent
/// writers across sessions are expected, and per-session user-message
/// counts are authoritative here, never in caller-side caches.
pub trait ConversationRepository: Send + Sync {
    /// Append a completed turn and return the new per-session turn count.
    ///
    /// The returned count is read back from the store after the insert so
    /// that concurrent writers to the same session are observed.
    fn insert_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// The most recent `limit` turns for a session, oldest-first.
    fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// The number of persisted turns for a session.
    fn turn_count(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// The session's rolling summary, if one has been written.
    fn current_summary(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RollingSummary>, RepositoryError>> + Send;

    /// Overwrite the session's rolling summary. At most one summary exists
    /// per session; this replaces, never appends.
    fn replace_summary(
        &self,
        session_id: &str,
        text: &str,
        at_count: u64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the oldest `count` turns for a session. Deleting more turns
    /// than exist is a no-op for the missing rows.
    fn delete_oldest_turns(
        &self,
        session_id: &str,
        count: u64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Record activity for a session (bumps last-activity and message count).
    fn touch_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store-wide statistics for the status endpoint.
    fn stats(&self) -> impl std::future::Future<Output = Result<StoreStats, RepositoryError>> + Send;
}
