//! Vector archive port traits.
//!
//! `VectorStore` and `Embedder` are implemented in lorekeep-infra
//! (LanceDB + fastembed); the box wrappers enable runtime selection.

pub mod boxed;
pub mod embedder;
pub mod vector;

pub use boxed::{BoxEmbedder, BoxVectorStore};
pub use embedder::Embedder;
pub use vector::VectorStore;
