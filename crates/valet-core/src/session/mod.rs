//! Session ownership: the fixed actor pool and per-conversation actors.

pub mod actor;
pub mod pool;

pub use actor::{ActorStatus, SessionActor};
pub use pool::SessionPool;
