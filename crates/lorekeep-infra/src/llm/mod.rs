//! LLM provider implementations.

pub mod groq;
pub mod key;

pub use groq::GroqProvider;
