//! WebSocket handler: one connection, one claimed session actor.
//!
//! The `/ws` endpoint upgrades an HTTP connection, claims an actor
//! from the session pool, and binds the connection to it for its whole
//! lifetime. On connect, persisted history is replayed (or a greeting sent
//! for a fresh session). Inbound frames are dispatched by tag:
//!
//! - `chat` runs the reply pipeline in a spawned task so the connection
//!   stays responsive to `ping` while inference is in flight.
//! - `ping` is answered immediately with `pong`.
//! - malformed frames get an `error` frame; the connection stays open.
//!
//! Closing the connection releases the actor. In-flight reply pipelines
//! and background compaction run to completion detached from the
//! connection lifecycle.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use valet_types::chat::Turn;
use valet_types::error::EngineError;
use valet_types::protocol::{ClientFrame, HistoryTurn, ServerFrame};

use crate::state::AppState;

/// Turns replayed to a resuming client.
const HISTORY_REPLAY_LIMIT: usize = 50;

/// Outbound frames buffered per connection before backpressure.
const OUTBOUND_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Upgrade an HTTP request to a WebSocket chat connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, params.session_id))
}

fn new_session_id() -> String {
    format!("session_{}", Uuid::now_v7())
}

fn greeting_frame(session_id: &str) -> ServerFrame {
    ServerFrame::Connected {
        message: "Hello! I'm Valet. How can I help you today?".to_string(),
        session_id: session_id.to_string(),
    }
}

/// Pick the first frame sent on a fresh connection: replay history when
/// the session has persisted turns, greet otherwise. A history read
/// failure degrades to the greeting rather than dropping the connection.
fn opening_frame(session_id: &str, history: Result<Vec<Turn>, EngineError>) -> ServerFrame {
    match history {
        Ok(turns) if !turns.is_empty() => ServerFrame::ChatHistory {
            session_id: session_id.to_string(),
            turns: turns
                .into_iter()
                .map(|t| HistoryTurn {
                    user_input: t.user_input,
                    response: t.response,
                    timestamp: t.timestamp,
                })
                .collect(),
        },
        Ok(_) => greeting_frame(session_id),
        Err(err) => {
            tracing::warn!(session_id, error = %err, "history replay failed, greeting instead");
            greeting_frame(session_id)
        }
    }
}

fn apology_frame(session_id: &str) -> ServerFrame {
    ServerFrame::ChatResponse {
        message: "Sorry, I'm having trouble responding right now. Please try again.".to_string(),
        session_id: session_id.to_string(),
        used_retrieval: false,
        context_turns_used: 0,
    }
}

async fn handle_connection(socket: WebSocket, state: AppState, session_id: Option<String>) {
    let session_id = session_id.unwrap_or_else(new_session_id);

    let actor = match state.pool.acquire(&session_id) {
        Ok(actor) => actor,
        Err(err) => {
            // Pool exhausted: report a retryable busy condition and close.
            let mut socket = socket;
            let frame = ServerFrame::Error {
                message: format!("{err}, retry shortly"),
            };
            if let Ok(json) = serde_json::to_string(&frame) {
                let _ = socket.send(Message::Text(json.into())).await;
            }
            return;
        }
    };

    if let Err(err) = actor.open_connection() {
        tracing::error!(session_id, error = %err, "claimed actor refused connection");
        actor.release();
        return;
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(OUTBOUND_BUFFER);

    // Single writer task; reply pipelines and the dispatch loop all send
    // through the channel.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!("failed to serialize outbound frame: {err}");
                }
            }
        }
    });

    // Resume the conversation: replay history if any exists, otherwise
    // greet a fresh session.
    let history = state.engine.history(&session_id, HISTORY_REPLAY_LIMIT).await;
    if tx.send(opening_frame(&session_id, history)).await.is_err() {
        actor.release();
        return;
    }

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Chat { message, .. }) => {
                    let _ = tx.send(ServerFrame::Thinking {
                        message: "Thinking...".to_string(),
                    })
                    .await;

                    // The pipeline runs in its own task so the dispatch
                    // loop keeps answering pings while inference is slow.
                    let engine = state.engine.clone();
                    let tx = tx.clone();
                    let session_id = session_id.clone();
                    tokio::spawn(async move {
                        let frame = match engine.reply(&session_id, &message).await {
                            Ok(reply) => ServerFrame::ChatResponse {
                                message: reply.message,
                                session_id: session_id.clone(),
                                used_retrieval: reply.used_retrieval,
                                context_turns_used: reply.context_turns_used,
                            },
                            Err(err) => {
                                tracing::error!(session_id, error = %err, "reply pipeline failed");
                                apology_frame(&session_id)
                            }
                        };
                        let _ = tx.send(frame).await;
                    });
                }
                Ok(ClientFrame::Ping) => {
                    if tx.send(ServerFrame::Pong).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(ServerFrame::Error {
                        message: format!("malformed frame: {err}"),
                    })
                    .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(session_id, "WebSocket receive error: {err}");
                break;
            }
            // Binary and protocol-level ping/pong frames are ignored.
            Ok(_) => {}
        }
    }

    actor.release();
    drop(tx);
    let _ = writer.await;
    tracing::debug!(session_id, "WebSocket connection closed");
}
