//! Agent assembly from configuration and environment.
//!
//! This is where construction-time key validation happens: with
//! `validate_api_key` set, a missing or malformed `GROQ_API_KEY` fails fast
//! with `ConfigError` before any component is built.

use secrecy::SecretString;

use lorekeep_core::agent::SeriesAgent;
use lorekeep_core::llm::BoxLlmProvider;
use lorekeep_core::store::{BoxEmbedder, BoxVectorStore};
use lorekeep_types::config::AgentConfig;
use lorekeep_types::error::AgentError;

use crate::llm::{key, GroqProvider};
use crate::vector::{FastembedEmbedder, HashedEmbedder, LanceArchiveStore};

/// Build a fully wired [`SeriesAgent`]: Groq provider from the environment,
/// LanceDB store at the configured data directory, fastembed embedder with
/// hashed fallback.
pub async fn build_agent(config: AgentConfig) -> Result<SeriesAgent, AgentError> {
    config.validate()?;

    let api_key = if config.validate_api_key {
        Some(key::require_api_key(true)?)
    } else {
        key::load_api_key(false)?
    };
    let llm_configured = api_key.is_some();

    let provider = GroqProvider::new(
        api_key.unwrap_or_else(|| SecretString::from("")),
        config.model.clone(),
    );

    let store = LanceArchiveStore::new(config.data_dir.clone(), config.series_slug()).await?;

    let embedder = match FastembedEmbedder::new() {
        Ok(embedder) => BoxEmbedder::new(embedder),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "local embedding model unavailable, falling back to hashed embeddings \
                 (reduced semantic search quality)"
            );
            BoxEmbedder::new(HashedEmbedder)
        }
    };

    SeriesAgent::new(
        config,
        BoxLlmProvider::new(provider),
        BoxVectorStore::new(store),
        embedder,
        llm_configured,
    )
}
