//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `valet-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, writes on the
//! writer pool and reads on the reader pool.

use chrono::{DateTime, Utc};
use sqlx::Row;

use valet_core::chat::ConversationRepository;
use valet_types::chat::{RollingSummary, StoreStats, Turn};
use valet_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct TurnRow {
    session_id: String,
    user_input: String,
    response: String,
    timestamp: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            user_input: row.try_get("user_input")?,
            response: row.try_get("response")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        Ok(Turn {
            session_id: self.session_id,
            user_input: self.user_input,
            response: self.response,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

struct SummaryRow {
    session_id: String,
    summary_text: String,
    last_compacted_turn_count: i64,
    updated_at: String,
}

impl SummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            summary_text: row.try_get("summary_text")?,
            last_compacted_turn_count: row.try_get("last_compacted_turn_count")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_summary(self) -> Result<RollingSummary, RepositoryError> {
        Ok(RollingSummary {
            session_id: self.session_id,
            text: self.summary_text,
            last_compacted_turn_count: self.last_compacted_turn_count as u64,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn insert_turn(&self, turn: &Turn) -> Result<u64, RepositoryError> {
        sqlx::query(
            "INSERT INTO turns (session_id, user_input, response, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&turn.session_id)
        .bind(&turn.user_input)
        .bind(&turn.response)
        .bind(format_datetime(&turn.timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Count is read back after the insert so concurrent writers to the
        // same session are observed.
        self.turn_count(&turn.session_id).await
    }

    async fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT session_id, user_input, response, timestamp FROM (
                   SELECT id, session_id, user_input, response, timestamp
                   FROM turns WHERE session_id = ?
                   ORDER BY timestamp DESC, id DESC LIMIT ?
               ) ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                TurnRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_turn()
            })
            .collect()
    }

    async fn turn_count(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM turns WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn current_summary(
        &self,
        session_id: &str,
    ) -> Result<Option<RollingSummary>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rolling_summaries WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let summary_row = SummaryRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(summary_row.into_summary()?))
            }
            None => Ok(None),
        }
    }

    async fn replace_summary(
        &self,
        session_id: &str,
        text: &str,
        at_count: u64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO rolling_summaries (session_id, summary_text, last_compacted_turn_count, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET
                   summary_text = excluded.summary_text,
                   last_compacted_turn_count = MAX(last_compacted_turn_count, excluded.last_compacted_turn_count),
                   updated_at = excluded.updated_at"#,
        )
        .bind(session_id)
        .bind(text)
        .bind(at_count as i64)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn delete_oldest_turns(
        &self,
        session_id: &str,
        count: u64,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"DELETE FROM turns WHERE id IN (
                   SELECT id FROM turns WHERE session_id = ?
                   ORDER BY timestamp ASC, id ASC LIMIT ?
               )"#,
        )
        .bind(session_id)
        .bind(count as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn touch_session(&self, session_id: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO session_stats (session_id, last_activity, message_count)
               VALUES (?, ?, 1)
               ON CONFLICT(session_id) DO UPDATE SET
                   last_activity = excluded.last_activity,
                   message_count = message_count + 1"#,
        )
        .bind(session_id)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let (total_turns, unique_sessions): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT session_id) FROM turns",
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let (memories_stored,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memory_bank")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(StoreStats {
            total_turns: total_turns as u64,
            memories_stored: memories_stored as u64,
            unique_sessions: unique_sessions as u64,
        })
    }
}
