//! Long-term memory: fact extraction, vector retrieval, and compaction.

pub mod box_embedder;
pub mod box_vector;
pub mod compaction;
pub mod embedder;
pub mod extractor;
pub mod retriever;
pub mod store;
pub mod vector;

pub use box_embedder::BoxEmbedder;
pub use box_vector::BoxVectorIndex;
pub use compaction::Compactor;
pub use embedder::Embedder;
pub use extractor::FactExtractor;
pub use retriever::ContextRetriever;
pub use store::MemoryStore;
pub use vector::{VectorIndex, VectorMatch};
