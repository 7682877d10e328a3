//! Infrastructure layer for Lorekeep.
//!
//! Contains implementations of the port traits defined in `lorekeep-core`:
//! the Groq chat-completions provider, the LanceDB archive store, the
//! fastembed local embedder (with a deterministic hashed fallback), and the
//! TOML settings loader.

pub mod builder;
pub mod config;
pub mod llm;
pub mod vector;
