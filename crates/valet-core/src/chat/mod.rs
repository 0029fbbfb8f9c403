//! The reply pipeline: bounded context assembly, inference, persistence.

pub mod engine;
pub mod prompt;
pub mod repository;

pub use engine::{ChatEngine, ChatReply};
pub use repository::ConversationRepository;
