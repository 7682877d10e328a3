//! Shared domain types for Lorekeep.
//!
//! This crate contains the narrative records stored in the knowledge base
//! (Episode, Scene, Character, Relationship, PlotEvent), the LLM
//! request/response types, search/collection types, agent configuration,
//! and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono,
//! thiserror.

pub mod character;
pub mod config;
pub mod episode;
pub mod error;
pub mod event;
pub mod llm;
pub mod relationship;
pub mod scene;
pub mod search;
