//! Summary generation with cross-referencing.
//!
//! Reads already-persisted structured data, builds a synthesis prompt, and
//! asks the LLM for prose. Idempotent given unchanged underlying data; never
//! cached. The episode summary falls back to the stored digest when the LLM
//! call fails; the profile/relationship/arc summaries are assembled from
//! stored records without an LLM call.

use std::sync::Arc;

use lorekeep_types::error::AgentError;
use lorekeep_types::relationship::Relationship;
use lorekeep_types::search::{Collection, SearchFilter};

use crate::archive::SeriesArchive;
use crate::extract::json::complete_text;
use crate::extract::prompts;
use crate::llm::BoxLlmProvider;

/// Generates prose summaries from stored narrative data.
#[derive(Clone)]
pub struct SummaryGenerator {
    archive: Arc<SeriesArchive>,
    provider: Arc<BoxLlmProvider>,
    temperature: f64,
}

impl SummaryGenerator {
    pub fn new(archive: Arc<SeriesArchive>, provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self { archive, provider, temperature }
    }

    /// Comprehensive episode summary synthesized by the LLM from stored
    /// scene summaries. Falls back to the stored digest on LLM failure.
    #[tracing::instrument(name = "episode_summary", skip(self))]
    pub async fn episode_summary(&self, episode_id: &str) -> Result<String, AgentError> {
        let Some(episode) = self.archive.get_episode(episode_id).await? else {
            return Ok(format!("Episode {episode_id} not found."));
        };

        let scenes = self.archive.scenes_for_episode(episode_id).await?;
        let scene_summaries: Vec<String> = scenes
            .iter()
            .take(10)
            .map(|scene| {
                let number = scene.meta_f64("scene_number").unwrap_or(0.0) as u64;
                let summary = scene.meta_str("summary").unwrap_or("No summary");
                format!("Scene {number}: {summary}")
            })
            .collect();

        let title = episode.meta_str("title").unwrap_or("Unknown Title").to_string();
        let season = episode
            .meta_f64("season")
            .map(|s| (s as u64).to_string())
            .unwrap_or_else(|| "?".to_string());
        let episode_num = episode
            .meta_f64("episode")
            .map(|e| (e as u64).to_string())
            .unwrap_or_else(|| "?".to_string());

        let scenes_text = if scene_summaries.is_empty() {
            "No scene summaries available.".to_string()
        } else {
            scene_summaries.join("\n")
        };
        let user = prompts::episode_summary_user(&season, &episode_num, &title, episode_id, &scenes_text);

        match complete_text(&self.provider, prompts::EPISODE_SUMMARY_SYSTEM, &user, self.temperature)
            .await
        {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::warn!(error = %e, episode_id, "summary generation failed, using stored digest");
                let digest = episode
                    .meta_str("summary")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Episode {episode_id}: {title}"));
                Ok(digest)
            }
        }
    }

    /// Markdown character profile assembled from the stored record.
    pub async fn character_profile_text(&self, name: &str) -> Result<String, AgentError> {
        let Some(character) = self.archive.get_character_record(name).await? else {
            return Ok(format!("Character '{name}' not found."));
        };

        let mut parts = vec![format!("# Character Profile: {name}")];
        parts.push(format!("Role: {}", character.role));
        if let Some(first) = &character.first_appearance {
            parts.push(format!("First Appearance: {first}"));
        }
        if !character.personality_traits.is_empty() {
            parts.push(format!("Personality Traits: {}", character.personality_traits.join(", ")));
        }
        if let Some(arc) = &character.character_arc {
            parts.push(format!("Character Arc: {arc}"));
        }

        let relationships = self.relationships_involving(name).await?;
        if !relationships.is_empty() {
            parts.push("\n## Relationships:".to_string());
            for rel in relationships.iter().take(5) {
                let other = rel.other_character(name).unwrap_or("?");
                parts.push(format!("- {other}: {}", rel.relationship_type));
            }
        }

        if !character.episode_appearances.is_empty() {
            let mut appearances = character.episode_appearances.clone();
            appearances.sort();
            parts.push(format!("\nAppearances: {} episodes", appearances.len()));
            if appearances.len() <= 10 {
                parts.push(format!("Episodes: {}", appearances.join(", ")));
            } else {
                parts.push(format!(
                    "Episodes: {}... and {} more",
                    appearances[..10].join(", "),
                    appearances.len() - 10
                ));
            }
        }

        Ok(parts.join("\n"))
    }

    /// Relationship summary for a pair, order-independent.
    pub async fn relationship_summary_text(&self, a: &str, b: &str) -> Result<String, AgentError> {
        let Some(rel) = self.archive.get_relationship_record(a, b).await? else {
            return Ok(format!("No relationship found between {a} and {b}."));
        };

        let mut parts = vec![format!("# Relationship: {a} & {b}")];
        parts.push(format!("Type: {}", rel.relationship_type));
        parts.push(format!("Status: {}", rel.current_status));
        if let Some(first) = &rel.first_interaction {
            parts.push(format!("First Interaction: {first}"));
        }
        if let Some(description) = &rel.description {
            parts.push(format!("Description: {description}"));
        }
        if !rel.changes.is_empty() {
            parts.push("\n## Timeline:".to_string());
            for change in rel.timeline() {
                parts.push(format!("- {}: {}", change.episode_id, change.description));
            }
        }
        Ok(parts.join("\n"))
    }

    /// Plot arc summary: span and key events, episode-ordered.
    pub async fn plot_arc_summary_text(&self, arc_name: &str) -> Result<String, AgentError> {
        let filter = SearchFilter::PlotArc(arc_name.to_string());
        let mut events = self.archive.scan(Collection::PlotEvents, Some(&filter), 100).await?;
        if events.is_empty() {
            return Ok(format!("No events found for plot arc '{arc_name}'."));
        }
        events.sort_by(|a, b| {
            a.meta_str("episode_id").unwrap_or("").cmp(b.meta_str("episode_id").unwrap_or(""))
        });

        let mut parts = vec![format!("# Plot Arc: {arc_name}")];
        parts.push(format!("Total Events: {}", events.len()));
        let first = events.first().and_then(|e| e.meta_str("episode_id")).unwrap_or("?");
        let last = events.last().and_then(|e| e.meta_str("episode_id")).unwrap_or("?");
        parts.push(format!("Span: {first} to {last}"));

        parts.push("\n## Key Events:".to_string());
        for event in events.iter().take(10) {
            let episode = event.meta_str("episode_id").unwrap_or("Unknown");
            let title = event.meta_str("title").unwrap_or("Untitled Event");
            let importance = event.meta_str("importance").unwrap_or("medium");
            parts.push(format!("- {episode}: {title} ({importance})"));
        }
        Ok(parts.join("\n"))
    }

    async fn relationships_involving(&self, name: &str) -> Result<Vec<Relationship>, AgentError> {
        let entries = self.archive.scan(Collection::Relationships, None, usize::MAX).await?;
        let mut relationships: Vec<Relationship> = entries
            .into_iter()
            .filter_map(|entry| entry.metadata.get("record").cloned())
            .filter_map(|value| serde_json::from_value::<Relationship>(value).ok())
            .filter(|rel| rel.involves(name))
            .collect();
        relationships.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxEmbedder, BoxVectorStore};
    use crate::testing::{MockProvider, StubEmbedder, StubStore};
    use lorekeep_types::character::Character;
    use lorekeep_types::episode::{Episode, EpisodeInfo};
    use lorekeep_types::event::PlotEvent;
    use lorekeep_types::llm::LlmError;
    use lorekeep_types::scene::Scene;

    fn generator_with(responses: Vec<Result<String, LlmError>>) -> (SummaryGenerator, Arc<SeriesArchive>) {
        let archive = Arc::new(SeriesArchive::new(
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
        ));
        let provider = Arc::new(BoxLlmProvider::new(MockProvider::with_results(responses)));
        (SummaryGenerator::new(archive.clone(), provider, 0.1), archive)
    }

    async fn seed_episode(archive: &SeriesArchive) {
        let mut episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "transcript text here");
        episode.summary = Some("Digest: Alice arrives.".to_string());
        archive.add_episode(&episode).await.unwrap();

        let mut scene = Scene::new("S01E01", 1, "Alice arrives in town");
        scene.summary = Some("Alice arrives in town.".to_string());
        archive.add_scene(&scene).await.unwrap();
    }

    #[tokio::test]
    async fn test_episode_summary_uses_llm() {
        let (generator, archive) =
            generator_with(vec![Ok("A rich, engaging episode summary.".to_string())]);
        seed_episode(&archive).await;

        let summary = generator.episode_summary("S01E01").await.unwrap();
        assert_eq!(summary, "A rich, engaging episode summary.");
    }

    #[tokio::test]
    async fn test_episode_summary_falls_back_to_digest() {
        let (generator, archive) =
            generator_with(vec![Err(LlmError::AuthenticationFailed)]);
        seed_episode(&archive).await;

        let summary = generator.episode_summary("S01E01").await.unwrap();
        assert_eq!(summary, "Digest: Alice arrives.");
    }

    #[tokio::test]
    async fn test_missing_episode_reports_not_found() {
        let (generator, _archive) = generator_with(vec![]);
        let summary = generator.episode_summary("S09E09").await.unwrap();
        assert!(summary.contains("not found"));
    }

    #[tokio::test]
    async fn test_character_profile_text() {
        let (generator, archive) = generator_with(vec![]);
        let mut character = Character::new("Alice");
        character.personality_traits = vec!["determined".to_string()];
        character.add_appearance("S01E01");
        archive.add_character(&character).await.unwrap();

        let mut rel = Relationship::new("Alice", "Bob");
        rel.relationship_type = "rivalry".parse().unwrap();
        archive.add_relationship(&rel).await.unwrap();

        let profile = generator.character_profile_text("Alice").await.unwrap();
        assert!(profile.contains("# Character Profile: Alice"));
        assert!(profile.contains("Personality Traits: determined"));
        assert!(profile.contains("- Bob: rivalry"));
        assert!(profile.contains("Appearances: 1 episodes"));
    }

    #[tokio::test]
    async fn test_plot_arc_summary_orders_by_episode() {
        let (generator, archive) = generator_with(vec![]);
        for (id, episode_id) in [("e2", "S01E03"), ("e1", "S01E01")] {
            let mut event = PlotEvent::new(id, format!("Event {id}"), "desc", episode_id);
            event.plot_arc = Some("the letter".to_string());
            archive.add_plot_event(&event).await.unwrap();
        }

        let summary = generator.plot_arc_summary_text("the letter").await.unwrap();
        assert!(summary.contains("Span: S01E01 to S01E03"));
        assert!(summary.contains("Total Events: 2"));
    }

    #[tokio::test]
    async fn test_relationship_summary_is_symmetric() {
        let (generator, archive) = generator_with(vec![]);
        let rel = Relationship::new("Alice", "Bob");
        archive.add_relationship(&rel).await.unwrap();

        let ab = generator.relationship_summary_text("Alice", "Bob").await.unwrap();
        let ba = generator.relationship_summary_text("Bob", "Alice").await.unwrap();
        // Same underlying record either way.
        assert!(ab.contains("Type:"));
        assert_eq!(
            ab.lines().skip(1).collect::<Vec<_>>(),
            ba.lines().skip(1).collect::<Vec<_>>()
        );
    }
}
