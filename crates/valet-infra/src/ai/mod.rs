//! Clients for the AI gateway (chat inference and embeddings).

pub mod workers;

pub use workers::WorkersAiClient;
