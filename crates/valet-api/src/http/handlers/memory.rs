//! Memory bank endpoints: inspection and explicit operator deletes.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use valet_core::memory::MemoryStore;
use valet_types::memory::Memory;

use crate::http::error::AppError;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `GET /api/v1/memories?limit=N` -- highest-importance memories first.
pub async fn list_memories(
    Query(params): Query<ListParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Memory>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let memories = state.memories.top_memories(limit).await?;
    Ok(Json(memories))
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub ids: Vec<Uuid>,
}

/// `DELETE /api/v1/memories` -- delete memories by id.
///
/// Deletion is the only mutation the memory bank supports, and only
/// through this explicit operator surface. The matching vector index
/// entries are removed as well; that removal is strict, not best-effort.
pub async fn delete_memories(
    State(state): State<AppState>,
    Json(body): Json<DeleteBody>,
) -> Result<Json<Value>, AppError> {
    if body.ids.is_empty() {
        return Err(AppError::Validation("ids must not be empty".to_string()));
    }
    let deleted = state.memories.delete_memories(&body.ids).await?;

    let vector_ids: Vec<String> = body.ids.iter().map(Uuid::to_string).collect();
    state.retriever.remove(&vector_ids).await?;

    Ok(Json(json!({ "deleted": deleted })))
}

/// `DELETE /api/v1/memories/{id}` -- delete a single memory.
pub async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.memories.delete_memories(&[id]).await?;
    if deleted == 0 {
        return Err(AppError::Repository(
            valet_types::error::RepositoryError::NotFound,
        ));
    }
    state.retriever.remove(&[id.to_string()]).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
