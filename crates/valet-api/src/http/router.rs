//! Axum router configuration with middleware.
//!
//! The WebSocket chat endpoint lives at `/ws`; REST routes are under
//! `/api/v1/`. Middleware: CORS and tracing.

use axum::Router;
use axum::routing::{delete, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::status::get_status))
        .route("/pool", get(handlers::status::get_pool))
        .route("/memories", get(handlers::memory::list_memories))
        .route("/memories", delete(handlers::memory::delete_memories))
        .route("/memories/{id}", delete(handlers::memory::delete_memory));

    Router::new()
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(handlers::status::get_health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
