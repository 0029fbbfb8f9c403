//! SQLite persistence for conversations and the memory bank.

pub mod conversation;
pub mod memory;
pub mod pool;

pub use conversation::SqliteConversationRepository;
pub use memory::SqliteMemoryStore;
pub use pool::DatabasePool;
