//! Vector index client.

pub mod vectorize;

pub use vectorize::VectorizeClient;
