//! SQLite memory bank implementation.
//!
//! Implements `MemoryStore` from `valet-core`. Memories are insert-only;
//! the sole mutation is an explicit operator delete.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use valet_core::memory::MemoryStore;
use valet_types::error::RepositoryError;
use valet_types::memory::{ExtractedFact, Memory, MemoryCategory};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MemoryStore`.
pub struct SqliteMemoryStore {
    pool: DatabasePool,
}

impl SqliteMemoryStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MemoryRow {
    id: String,
    category: String,
    content: String,
    importance: i64,
    created_at: String,
}

impl MemoryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            category: row.try_get("category")?,
            content: row.try_get("content")?,
            importance: row.try_get("importance")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_memory(self) -> Result<Memory, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid memory id: {e}")))?;
        let category: MemoryCategory = self
            .category
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Memory {
            id,
            category,
            content: self.content,
            importance: self.importance as u8,
            created_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl MemoryStore for SqliteMemoryStore {
    async fn save_fact(&self, fact: &ExtractedFact) -> Result<Memory, RepositoryError> {
        let memory = Memory {
            id: Uuid::now_v7(),
            category: fact.category,
            content: fact.content.clone(),
            importance: fact.importance,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO memory_bank (id, category, content, importance, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(memory.id.to_string())
        .bind(memory.category.to_string())
        .bind(&memory.content)
        .bind(memory.importance as i64)
        .bind(memory.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(memory)
    }

    async fn top_memories(&self, limit: usize) -> Result<Vec<Memory>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM memory_bank ORDER BY importance DESC, created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                MemoryRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_memory()
            })
            .collect()
    }

    async fn memory_count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memory_bank")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn delete_memories(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        let mut deleted = 0u64;
        for id in ids {
            let result = sqlx::query("DELETE FROM memory_bank WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            deleted += result.rows_affected();
        }
        Ok(deleted)
    }
}
