//! Vector archive infrastructure.
//!
//! LanceDB-backed persistent store, an in-process store for tests and
//! ephemeral use, fastembed local embedding, and the Arrow schema shared by
//! all five collections.

pub mod embedder;
pub mod lance;
pub mod memory;
pub mod schema;

pub use embedder::{FastembedEmbedder, HashedEmbedder};
pub use lance::LanceArchiveStore;
pub use memory::MemoryVectorStore;
