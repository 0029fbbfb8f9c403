//! HTTP and WebSocket request handlers.

pub mod memory;
pub mod status;
pub mod ws;
