//! Status endpoints: store aggregates and pool occupancy.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use valet_core::chat::ConversationRepository;
use valet_core::memory::MemoryStore;

use crate::http::error::AppError;
use crate::state::AppState;

/// `GET /api/v1/status` -- store-wide aggregates plus pool headline numbers.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.repository.stats().await?;
    let memories = state.memories.memory_count().await?;

    Ok(Json(json!({
        "status": "ok",
        "store": {
            "total_turns": stats.total_turns,
            "unique_sessions": stats.unique_sessions,
            "memories_stored": memories,
        },
        "pool": {
            "size": state.pool.size(),
            "available": state.pool.available(),
        },
    })))
}

/// `GET /api/v1/pool` -- per-slot occupancy, in slot order.
pub async fn get_pool(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "slots": state.pool.status() }))
}

/// `GET /health` -- liveness probe, no database access.
pub async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
