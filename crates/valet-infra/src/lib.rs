//! Infrastructure implementations for Valet.
//!
//! Everything that talks to the outside world lives here: the SQLite
//! persistence layer, the Workers AI gateway client (inference +
//! embeddings), the vector index client, and the configuration loader.
//! The traits these implement are defined in `valet-core`.

pub mod ai;
pub mod config;
pub mod sqlite;
pub mod vector;
