//! In-memory collaborator stubs shared across the crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use valet_types::chat::{RollingSummary, StoreStats, Turn};
use valet_types::error::RepositoryError;
use valet_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use valet_types::memory::{ExtractedFact, Memory};

use crate::chat::ConversationRepository;
use crate::llm::LlmProvider;
use crate::memory::embedder::Embedder;
use crate::memory::store::MemoryStore;
use crate::memory::vector::{VectorIndex, VectorMatch};

/// LLM stub that always answers with a fixed reply.
pub struct StubLlm {
    reply: String,
}

impl StubLlm {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
        })
    }
}

/// LLM stub that always fails.
pub struct FailingLlm;

impl LlmProvider for FailingLlm {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Provider {
            message: "stubbed outage".to_string(),
        })
    }
}

/// Embedder stub producing a fixed four-dimensional vector per text.
#[derive(Default)]
pub struct StubEmbedder;

impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3, 0.4]).collect())
    }

    fn model_name(&self) -> &str {
        "stub-embed"
    }

    fn dimension(&self) -> usize {
        4
    }
}

/// Vector index stub with canned matches, or a permanently failing one.
pub struct StubVectorIndex {
    matches: Vec<VectorMatch>,
    failing: bool,
    upserted: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl StubVectorIndex {
    pub fn with_matches(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches,
            failing: false,
            upserted: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::with_matches(Vec::new())
        }
    }

    pub fn upserted_ids(&self) -> Vec<String> {
        self.upserted.lock().unwrap().clone()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl VectorIndex for StubVectorIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Query("index offline".to_string()));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn upsert(
        &self,
        id: &str,
        _vector: &[f32],
        _metadata: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Query("index offline".to_string()));
        }
        self.upserted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Query("index offline".to_string()));
        }
        self.deleted.lock().unwrap().extend(ids.iter().cloned());
        Ok(())
    }
}

// Arc delegation so tests can keep a handle for inspection after boxing.
impl VectorIndex for std::sync::Arc<StubVectorIndex> {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, RepositoryError> {
        self.as_ref().query(vector, top_k).await
    }

    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        self.as_ref().upsert(id, vector, metadata).await
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), RepositoryError> {
        self.as_ref().delete_by_ids(ids).await
    }
}

/// In-memory conversation repository.
#[derive(Default)]
pub struct MemoryRepository {
    turns: Mutex<HashMap<String, Vec<Turn>>>,
    summaries: Mutex<HashMap<String, RollingSummary>>,
    touched: Mutex<HashMap<String, u64>>,
}

impl MemoryRepository {
    /// Insert `count` synthetic turns for `session_id`.
    pub async fn seed_turns(&self, session_id: &str, count: usize) {
        let mut turns = self.turns.lock().unwrap();
        let entry = turns.entry(session_id.to_string()).or_default();
        for i in 0..count {
            entry.push(Turn {
                session_id: session_id.to_string(),
                user_input: format!("input {i}"),
                response: format!("response {i}"),
                timestamp: Utc::now(),
            });
        }
    }
}

impl ConversationRepository for MemoryRepository {
    async fn insert_turn(&self, turn: &Turn) -> Result<u64, RepositoryError> {
        let mut turns = self.turns.lock().unwrap();
        let entry = turns.entry(turn.session_id.clone()).or_default();
        entry.push(turn.clone());
        Ok(entry.len() as u64)
    }

    async fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, RepositoryError> {
        let turns = self.turns.lock().unwrap();
        let all = turns.get(session_id).cloned().unwrap_or_default();
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn turn_count(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let turns = self.turns.lock().unwrap();
        Ok(turns.get(session_id).map_or(0, |t| t.len() as u64))
    }

    async fn current_summary(
        &self,
        session_id: &str,
    ) -> Result<Option<RollingSummary>, RepositoryError> {
        Ok(self.summaries.lock().unwrap().get(session_id).cloned())
    }

    async fn replace_summary(
        &self,
        session_id: &str,
        text: &str,
        at_count: u64,
    ) -> Result<(), RepositoryError> {
        self.summaries.lock().unwrap().insert(
            session_id.to_string(),
            RollingSummary {
                session_id: session_id.to_string(),
                text: text.to_string(),
                last_compacted_turn_count: at_count,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_oldest_turns(
        &self,
        session_id: &str,
        count: u64,
    ) -> Result<u64, RepositoryError> {
        let mut turns = self.turns.lock().unwrap();
        let Some(entry) = turns.get_mut(session_id) else {
            return Ok(0);
        };
        let removed = (count as usize).min(entry.len());
        entry.drain(..removed);
        Ok(removed as u64)
    }

    async fn touch_session(&self, session_id: &str) -> Result<(), RepositoryError> {
        *self
            .touched
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let turns = self.turns.lock().unwrap();
        Ok(StoreStats {
            total_turns: turns.values().map(|t| t.len() as u64).sum(),
            memories_stored: 0,
            unique_sessions: turns.len() as u64,
        })
    }
}

/// In-memory memory-bank store.
#[derive(Default)]
pub struct StubMemoryStore {
    memories: Mutex<Vec<Memory>>,
}

impl StubMemoryStore {
    pub async fn saved(&self) -> Vec<Memory> {
        self.memories.lock().unwrap().clone()
    }
}

impl MemoryStore for StubMemoryStore {
    async fn save_fact(&self, fact: &ExtractedFact) -> Result<Memory, RepositoryError> {
        let memory = Memory {
            id: Uuid::now_v7(),
            category: fact.category,
            content: fact.content.clone(),
            importance: fact.importance,
            created_at: Utc::now(),
        };
        self.memories.lock().unwrap().push(memory.clone());
        Ok(memory)
    }

    async fn top_memories(&self, limit: usize) -> Result<Vec<Memory>, RepositoryError> {
        let mut all = self.memories.lock().unwrap().clone();
        all.sort_by(|a, b| b.importance.cmp(&a.importance));
        all.truncate(limit);
        Ok(all)
    }

    async fn memory_count(&self) -> Result<u64, RepositoryError> {
        Ok(self.memories.lock().unwrap().len() as u64)
    }

    async fn delete_memories(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        let mut memories = self.memories.lock().unwrap();
        let before = memories.len();
        memories.retain(|m| !ids.contains(&m.id));
        Ok((before - memories.len()) as u64)
    }
}
