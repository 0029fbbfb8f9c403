//! Shared domain types for Valet.
//!
//! This crate contains the core domain types used across the Valet backend:
//! conversation turns, rolling summaries, memories, LLM messages, the
//! WebSocket protocol frames, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod protocol;
