//! Groq LLM provider.
//!
//! Groq exposes an OpenAI-compatible chat-completions API; the client here
//! talks to it directly over reqwest.

mod client;
mod types;

pub use client::GroqProvider;
