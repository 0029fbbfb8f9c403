//! WebSocket protocol frames.
//!
//! Frames are a closed, tagged set so the dispatcher is exhaustive and
//! compiler-checked. Inbound frames with malformed JSON or an unknown
//! `type` fail to deserialize and the connection answers with an
//! [`ServerFrame::Error`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound frame from a connected client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A user chat message. `session_id` is accepted for symmetry with the
    /// HTTP surface but the connection's claimed session always wins.
    Chat {
        message: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Keep-alive probe; answered immediately with [`ServerFrame::Pong`].
    Ping,
}

/// A single replayed exchange inside a [`ServerFrame::ChatHistory`] frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub user_input: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Outbound frame to a connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// One-time greeting for a fresh session.
    Connected { message: String, session_id: String },
    /// Replay of persisted turns when a session resumes.
    ChatHistory {
        session_id: String,
        turns: Vec<HistoryTurn>,
    },
    /// Progress frame emitted before the reply pipeline starts.
    Thinking { message: String },
    /// The assistant's reply plus pipeline metadata.
    ChatResponse {
        message: String,
        session_id: String,
        used_retrieval: bool,
        context_turns_used: usize,
    },
    Pong,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_frame_deserializes() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"chat","message":"hello"}"#).unwrap();
        match frame {
            ClientFrame::Chat { message, session_id } => {
                assert_eq!(message, "hello");
                assert!(session_id.is_none());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn ping_frame_deserializes() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Ping));
    }

    // Internally tagged enums ignore fields the variant does not declare;
    // clients sending extra metadata are tolerated.
    #[test]
    fn extra_fields_on_chat_frame_are_ignored() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"chat","message":"hello","client_version":"2.1"}"#,
        )
        .unwrap();
        assert!(matches!(frame, ClientFrame::Chat { .. }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"shout","message":"hi"}"#).is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>("{not json").is_err());
    }

    #[test]
    fn chat_response_serializes_with_tag() {
        let frame = ServerFrame::ChatResponse {
            message: "hi".to_string(),
            session_id: "s1".to_string(),
            used_retrieval: true,
            context_turns_used: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "chat_response");
        assert_eq!(json["used_retrieval"], true);
        assert_eq!(json["context_turns_used"], 3);
    }

    #[test]
    fn pong_serializes_bare() {
        let json = serde_json::to_string(&ServerFrame::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
