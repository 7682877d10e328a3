//! The composition root.
//!
//! `SeriesAgent` owns the provider, archive, processor, generator, and query
//! interface behind a small method surface. All state is instance-owned with
//! explicit lifecycle: opened on construction, dropped on disposal.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lorekeep_types::config::AgentConfig;
use lorekeep_types::episode::{Episode, EpisodeInfo};
use lorekeep_types::error::AgentError;

use crate::archive::SeriesArchive;
use crate::extract::BoxExtractor;
use crate::llm::BoxLlmProvider;
use crate::process::EpisodeProcessor;
use crate::query::interface::{
    CharacterProfile, CrossCollectionResults, EpisodeContext, MysteryReport, PlotArcSummary,
    RelationshipHistory, SceneSearchResults,
};
use crate::query::{build_relationship_graph, QueryInterface, RelationshipGraph};
use crate::store::{BoxEmbedder, BoxVectorStore};
use crate::summarize::SummaryGenerator;

/// Statistics about the processed series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesStatistics {
    pub series_name: String,
    pub totals: BTreeMap<String, u64>,
    pub database_location: String,
    pub has_episodes: bool,
    pub embedding_model: String,
    pub last_updated: DateTime<Utc>,
}

/// Overall health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health of a single component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<BTreeMap<String, u64>>,
}

/// Health report covering the database and the LLM configuration.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub series_name: String,
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub database: ComponentHealth,
    pub llm: ComponentHealth,
}

/// Complete data export for a single character.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterExport {
    pub character_name: String,
    pub profile: CharacterProfile,
    pub scenes: SceneSearchResults,
    pub exported_at: DateTime<Utc>,
}

/// Top-level agent for a single series knowledge base.
pub struct SeriesAgent {
    config: AgentConfig,
    archive: Arc<SeriesArchive>,
    processor: EpisodeProcessor,
    generator: SummaryGenerator,
    queries: QueryInterface,
    llm_configured: bool,
}

impl SeriesAgent {
    /// Assemble the agent from its ports. The caller (infrastructure layer)
    /// is responsible for API-key validation before constructing the
    /// provider; `llm_configured` feeds the health report.
    pub fn new(
        config: AgentConfig,
        provider: BoxLlmProvider,
        store: BoxVectorStore,
        embedder: BoxEmbedder,
        llm_configured: bool,
    ) -> Result<Self, AgentError> {
        config.validate()?;

        let provider = Arc::new(provider);
        let archive = Arc::new(SeriesArchive::new(store, embedder));
        let processor = EpisodeProcessor::new(archive.clone(), provider.clone(), config.temperature);
        let generator = SummaryGenerator::new(archive.clone(), provider.clone(), config.temperature);
        let queries = QueryInterface::new(archive.clone(), generator.clone());

        tracing::info!(
            series = %config.series_name,
            data_dir = %config.data_dir.display(),
            model = %config.model,
            temperature = config.temperature,
            "series agent initialized"
        );

        Ok(Self { config, archive, processor, generator, queries, llm_configured })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Process an episode transcript through the full pipeline.
    pub async fn process_episode(
        &self,
        transcript: &str,
        info: EpisodeInfo,
    ) -> Result<Episode, AgentError> {
        self.processor.process(transcript, info).await
    }

    /// Generate the comprehensive LLM episode summary.
    pub async fn generate_episode_summary(&self, season: u32, episode: u32) -> Result<String, AgentError> {
        let episode_id = format!("S{season:02}E{episode:02}");
        self.generator.episode_summary(&episode_id).await
    }

    pub async fn character_profile(&self, name: &str) -> Result<CharacterProfile, AgentError> {
        lorekeep_types::character::Character::validate_name(name)?;
        self.queries.character_profile(name).await
    }

    pub async fn relationship_history(
        &self,
        character1: &str,
        character2: &str,
    ) -> Result<RelationshipHistory, AgentError> {
        self.queries.relationship_history(character1, character2).await
    }

    pub async fn plot_arc_summary(&self, arc_name: &str) -> Result<PlotArcSummary, AgentError> {
        self.queries.plot_arc_summary(arc_name).await
    }

    pub async fn find_scene(&self, description: &str, n_results: usize) -> Result<SceneSearchResults, AgentError> {
        self.queries.find_scene(description, n_results).await
    }

    pub async fn episode_context(&self, season: u32, episode: u32) -> Result<EpisodeContext, AgentError> {
        self.queries.episode_context(season, episode).await
    }

    pub async fn track_mystery(&self, description: &str) -> Result<MysteryReport, AgentError> {
        self.queries.track_mystery(description).await
    }

    pub async fn search(&self, query: &str, n_results: usize) -> Result<CrossCollectionResults, AgentError> {
        self.queries.search_all(query, n_results).await
    }

    /// Export all stored data for one character.
    pub async fn export_character(&self, name: &str) -> Result<CharacterExport, AgentError> {
        let profile = self.queries.character_profile(name).await?;
        let scenes = self.queries.find_scene(&format!("scenes with {name}"), 100).await?;
        Ok(CharacterExport {
            character_name: name.to_string(),
            profile,
            scenes,
            exported_at: Utc::now(),
        })
    }

    /// Build the character relationship graph.
    pub async fn relationship_graph(&self) -> Result<RelationshipGraph, AgentError> {
        Ok(build_relationship_graph(&self.archive).await?)
    }

    /// Register a custom extractor to run per scene after the built-ins.
    pub fn register_extractor(&mut self, extractor: BoxExtractor) {
        self.processor.registry_mut().register(extractor);
    }

    pub async fn statistics(&self) -> Result<SeriesStatistics, AgentError> {
        let totals = self.archive.counts().await?;
        let has_episodes = totals.get("episodes").copied().unwrap_or(0) > 0;
        Ok(SeriesStatistics {
            series_name: self.config.series_name.clone(),
            totals,
            database_location: self.config.data_dir.display().to_string(),
            has_episodes,
            embedding_model: self.archive.embedding_model().to_string(),
            last_updated: Utc::now(),
        })
    }

    /// Reset the entire database. Returns `false` (and does nothing)
    /// unless `confirm` is true.
    pub async fn reset_database(&self, confirm: bool) -> Result<bool, AgentError> {
        if !confirm {
            tracing::warn!("database reset not confirmed, skipping");
            return Ok(false);
        }
        self.archive.reset().await?;
        Ok(true)
    }

    /// Health check: database reachability plus LLM key configuration.
    pub async fn health_check(&self) -> HealthReport {
        let database = match self.archive.counts().await {
            Ok(collections) => ComponentHealth {
                status: HealthStatus::Healthy,
                detail: None,
                collections: Some(collections),
            },
            Err(e) => ComponentHealth {
                status: HealthStatus::Unhealthy,
                detail: Some(e.to_string()),
                collections: None,
            },
        };

        let llm = if self.llm_configured {
            ComponentHealth { status: HealthStatus::Healthy, detail: None, collections: None }
        } else {
            ComponentHealth {
                status: HealthStatus::Degraded,
                detail: Some("API key not configured; extraction and generation unavailable".into()),
                collections: None,
            }
        };

        let status = match (database.status, llm.status) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };

        HealthReport {
            series_name: self.config.series_name.clone(),
            status,
            timestamp: Utc::now(),
            database,
            llm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, StubEmbedder, StubStore};
    use lorekeep_types::error::ValidationError;

    fn agent_with(responses: Vec<&'static str>, llm_configured: bool) -> SeriesAgent {
        SeriesAgent::new(
            AgentConfig::new("Test Show", "/tmp/lorekeep-test"),
            BoxLlmProvider::new(MockProvider::new(responses)),
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
            llm_configured,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let result = SeriesAgent::new(
            AgentConfig::new("", "/tmp/db"),
            BoxLlmProvider::new(MockProvider::new(vec![])),
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
            true,
        );
        assert!(matches!(
            result,
            Err(AgentError::Validation(ValidationError::InvalidSeriesName(_)))
        ));
    }

    #[tokio::test]
    async fn test_statistics_on_empty_archive() {
        let agent = agent_with(vec![], true);
        let stats = agent.statistics().await.unwrap();
        assert_eq!(stats.series_name, "Test Show");
        assert!(!stats.has_episodes);
        assert_eq!(stats.totals.len(), 5);
        assert!(stats.totals.values().all(|&v| v == 0));
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let agent = agent_with(vec![], true);
        assert!(!agent.reset_database(false).await.unwrap());
        assert!(agent.reset_database(true).await.unwrap());
    }

    #[tokio::test]
    async fn test_health_degraded_without_llm_key() {
        let agent = agent_with(vec![], false);
        let report = agent.health_check().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.database.status, HealthStatus::Healthy);
        assert_eq!(report.llm.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_health_healthy_with_llm_key() {
        let agent = agent_with(vec![], true);
        let report = agent.health_check().await;
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_character_profile_validates_name() {
        let agent = agent_with(vec![], true);
        let result = agent.character_profile("   ").await;
        assert!(matches!(result, Err(AgentError::Validation(_))));
    }
}
