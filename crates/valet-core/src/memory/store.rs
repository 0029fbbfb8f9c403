//! Persistence contract for the memory bank.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations live in valet-infra.

use uuid::Uuid;

use valet_types::error::RepositoryError;
use valet_types::memory::{ExtractedFact, Memory};

/// Repository for durable extracted memories.
///
/// Memories are independent of any session: never mutated after creation,
/// only deleted by explicit operator action.
pub trait MemoryStore: Send + Sync {
    /// Persist a freshly extracted fact and return the stored memory.
    fn save_fact(
        &self,
        fact: &ExtractedFact,
    ) -> impl std::future::Future<Output = Result<Memory, RepositoryError>> + Send;

    /// The highest-importance memories, best-first, newest-first on ties.
    fn top_memories(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Memory>, RepositoryError>> + Send;

    /// Total number of stored memories.
    fn memory_count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete memories by id. Unknown ids are ignored.
    fn delete_memories(
        &self,
        ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
