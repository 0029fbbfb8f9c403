//! Conversation types for Valet.
//!
//! A conversation is a sequence of [`Turn`]s scoped to a session id, plus at
//! most one [`RollingSummary`] holding everything compaction has folded away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single persisted exchange: one user input and the assistant's response.
///
/// Turns are immutable once written and ordered by `timestamp` within a
/// session. The only deletes are compaction deletes of the oldest turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub session_id: String,
    pub user_input: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// The condensed representation of all conversation history older than the
/// retained raw-turn window.
///
/// At most one per session; each compaction overwrites `text` rather than
/// appending. `last_compacted_turn_count` is monotonically non-decreasing
/// and always a multiple of the compaction window size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingSummary {
    pub session_id: String,
    pub text: String,
    pub last_compacted_turn_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Per-session activity counters, maintained alongside each persisted turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub last_activity: DateTime<Utc>,
    pub message_count: u32,
}

/// Store-wide aggregates for the status surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_turns: u64,
    pub memories_stored: u64,
    pub unique_sessions: u64,
}
