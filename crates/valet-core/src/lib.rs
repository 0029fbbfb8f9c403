//! Business logic and collaborator trait definitions for Valet.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements, plus the four stateful pieces of the
//! backend: the session pool, the session actor state machine, the reply
//! pipeline, and the memory compaction pipeline. It depends only on
//! `valet-types` -- never on `valet-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod memory;
pub mod session;

#[cfg(test)]
pub(crate) mod test_stubs;
