//! The public read API: profiles, histories, searches, context, mysteries.
//!
//! Read-only facade composing multi-collection lookups over the archive.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use lorekeep_types::error::{AgentError, StorageError, ValidationError};
use lorekeep_types::relationship::Relationship;
use lorekeep_types::search::{Collection, DocumentEntry, ScoredDocument};

use crate::archive::SeriesArchive;
use crate::summarize::SummaryGenerator;

/// A scene search hit formatted for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct SceneMatch {
    pub scene_id: String,
    pub episode_id: Option<String>,
    pub scene_number: Option<u64>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub characters: Vec<String>,
    pub importance_score: f64,
    pub relevance_score: f32,
}

impl SceneMatch {
    fn from_hit(hit: &ScoredDocument) -> Self {
        Self {
            scene_id: hit.entry.id.clone(),
            episode_id: hit.entry.meta_str("episode_id").map(str::to_string),
            scene_number: hit.entry.meta_f64("scene_number").map(|n| n as u64),
            summary: hit.entry.meta_str("summary").map(str::to_string),
            location: hit.entry.meta_str("location").map(str::to_string),
            characters: hit
                .entry
                .meta_str("characters_present")
                .map(|s| s.split(", ").map(str::to_string).collect())
                .unwrap_or_default(),
            importance_score: hit.entry.meta_f64("importance_score").unwrap_or(0.5),
            relevance_score: hit.relevance_score,
        }
    }
}

/// Ranked scene search results.
#[derive(Debug, Clone, Serialize)]
pub struct SceneSearchResults {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<SceneMatch>,
}

/// One relationship seen from a character's perspective.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipBrief {
    pub other_character: String,
    pub relationship_type: String,
    pub current_status: String,
    pub first_interaction: Option<String>,
    pub importance_score: f32,
    pub emotional_intensity: f32,
}

/// Comprehensive character profile.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterProfile {
    pub name: String,
    pub profile_summary: String,
    pub role: String,
    pub first_appearance: Option<String>,
    pub total_appearances: usize,
    pub importance_score: f32,
    pub relationships: Vec<RelationshipBrief>,
    pub key_scenes: Vec<SceneMatch>,
}

/// One entry in a relationship's evolution.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub episode_id: String,
    pub description: String,
}

/// Relationship history between two characters.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipHistory {
    pub character1: String,
    pub character2: String,
    pub relationship_type: String,
    pub current_status: String,
    pub first_interaction: Option<String>,
    pub summary: String,
    pub timeline: Vec<TimelineEntry>,
    pub interaction_scenes: Vec<SceneMatch>,
}

/// A plot event formatted for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct EventBrief {
    pub event_id: String,
    pub episode_id: Option<String>,
    pub title: Option<String>,
    pub importance: Option<String>,
    pub mystery_elements: Option<String>,
}

impl EventBrief {
    fn from_entry(entry: &DocumentEntry) -> Self {
        Self {
            event_id: entry.id.clone(),
            episode_id: entry.meta_str("episode_id").map(str::to_string),
            title: entry.meta_str("title").map(str::to_string),
            importance: entry.meta_str("importance").map(str::to_string),
            mystery_elements: entry
                .meta_str("mystery_elements")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Plot arc summary with its events.
#[derive(Debug, Clone, Serialize)]
pub struct PlotArcSummary {
    pub arc_name: String,
    pub summary: String,
    pub total_events: usize,
    pub episodes_involved: Vec<String>,
    pub episode_count: usize,
    pub events: Vec<EventBrief>,
}

/// A relationship established before a target episode.
#[derive(Debug, Clone, Serialize)]
pub struct KnownRelationship {
    pub character1: String,
    pub character2: String,
    pub relationship_type: String,
    pub established_in: String,
}

/// Everything known strictly before an episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeContext {
    pub target_episode: String,
    pub previous_episodes: Vec<String>,
    pub total_previous_episodes: usize,
    pub known_characters: Vec<String>,
    pub character_introductions: BTreeMap<String, String>,
    pub known_relationships: Vec<KnownRelationship>,
    pub active_plot_arcs: Vec<String>,
}

/// Mystery tracking: clues, resolutions, and related events.
#[derive(Debug, Clone, Serialize)]
pub struct MysteryReport {
    pub mystery: String,
    pub clues: Vec<EventBrief>,
    pub resolutions: Vec<EventBrief>,
    pub related_events: Vec<EventBrief>,
    pub total_clues: usize,
    pub total_resolutions: usize,
    pub is_resolved: bool,
}

/// A cross-collection search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub relevance_score: f32,
    pub snippet: String,
}

impl SearchHit {
    fn from_hit(hit: &ScoredDocument) -> Self {
        let snippet: String = hit.entry.document.chars().take(200).collect();
        Self { id: hit.entry.id.clone(), relevance_score: hit.relevance_score, snippet }
    }
}

/// Combined results across all collections.
#[derive(Debug, Clone, Serialize)]
pub struct CrossCollectionResults {
    pub query: String,
    pub hits: BTreeMap<String, Vec<SearchHit>>,
}

fn validate_query(query: &str) -> Result<(), ValidationError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidQuery("query cannot be empty".into()));
    }
    if trimmed.len() < 2 {
        return Err(ValidationError::InvalidQuery("query too short (minimum 2 characters)".into()));
    }
    if query.len() > 1000 {
        return Err(ValidationError::InvalidQuery("query too long (maximum 1000 characters)".into()));
    }
    Ok(())
}

/// Read-only facade over the archive.
#[derive(Clone)]
pub struct QueryInterface {
    archive: Arc<SeriesArchive>,
    generator: SummaryGenerator,
}

impl QueryInterface {
    pub fn new(archive: Arc<SeriesArchive>, generator: SummaryGenerator) -> Self {
        Self { archive, generator }
    }

    /// Comprehensive character profile by exact name.
    pub async fn character_profile(&self, name: &str) -> Result<CharacterProfile, AgentError> {
        let Some(character) = self.archive.get_character_record(name).await? else {
            return Err(StorageError::NotFound(format!("character '{name}'")).into());
        };

        let profile_summary = self.generator.character_profile_text(name).await?;

        let relationships = self.relationships_for(name).await?;
        let key_scenes = self
            .archive
            .query(Collection::Scenes, &format!("important scenes with {name}"), 10, None)
            .await?
            .iter()
            .map(SceneMatch::from_hit)
            .collect();

        Ok(CharacterProfile {
            name: name.to_string(),
            profile_summary,
            role: character.role.to_string(),
            first_appearance: character.first_appearance.clone(),
            total_appearances: character.episode_appearances.len(),
            importance_score: character.importance_score,
            relationships,
            key_scenes,
        })
    }

    /// Relationship history between two characters; symmetric in its
    /// arguments.
    pub async fn relationship_history(&self, a: &str, b: &str) -> Result<RelationshipHistory, AgentError> {
        let Some(rel) = self.archive.get_relationship_record(a, b).await? else {
            return Err(StorageError::NotFound(format!("relationship between {a} and {b}")).into());
        };

        let summary = self.generator.relationship_summary_text(a, b).await?;
        let interaction_scenes = self
            .archive
            .query(
                Collection::Scenes,
                &format!("{} and {} interact together", rel.character1, rel.character2),
                10,
                None,
            )
            .await?
            .iter()
            .map(SceneMatch::from_hit)
            .collect();

        let timeline = rel
            .timeline()
            .into_iter()
            .map(|change| TimelineEntry {
                episode_id: change.episode_id.clone(),
                description: change.description.clone(),
            })
            .collect();

        Ok(RelationshipHistory {
            character1: rel.character1.clone(),
            character2: rel.character2.clone(),
            relationship_type: rel.relationship_type.to_string(),
            current_status: rel.current_status.to_string(),
            first_interaction: rel.first_interaction.clone(),
            summary,
            timeline,
            interaction_scenes,
        })
    }

    /// Plot arc summary with its events and involved episodes.
    pub async fn plot_arc_summary(&self, arc_name: &str) -> Result<PlotArcSummary, AgentError> {
        let summary = self.generator.plot_arc_summary_text(arc_name).await?;

        let filter = lorekeep_types::search::SearchFilter::PlotArc(arc_name.to_string());
        let mut entries = self.archive.scan(Collection::PlotEvents, Some(&filter), 100).await?;
        entries.sort_by(|a, b| {
            a.meta_str("episode_id").unwrap_or("").cmp(b.meta_str("episode_id").unwrap_or(""))
        });

        let episodes_involved: BTreeSet<String> = entries
            .iter()
            .filter_map(|e| e.meta_str("episode_id").map(str::to_string))
            .collect();
        let events: Vec<EventBrief> = entries.iter().map(EventBrief::from_entry).collect();

        Ok(PlotArcSummary {
            arc_name: arc_name.to_string(),
            summary,
            total_events: events.len(),
            episode_count: episodes_involved.len(),
            episodes_involved: episodes_involved.into_iter().collect(),
            events,
        })
    }

    /// Semantic scene search. Deterministic given fixed embeddings.
    pub async fn find_scene(&self, description: &str, n_results: usize) -> Result<SceneSearchResults, AgentError> {
        validate_query(description)?;
        let hits = self.archive.query(Collection::Scenes, description, n_results, None).await?;
        let results: Vec<SceneMatch> = hits.iter().map(SceneMatch::from_hit).collect();
        Ok(SceneSearchResults {
            query: description.to_string(),
            total_results: results.len(),
            results,
        })
    }

    /// Everything known strictly before the given episode.
    pub async fn episode_context(&self, season: u32, episode: u32) -> Result<EpisodeContext, AgentError> {
        let target = format!("S{season:02}E{episode:02}");
        let episodes = self.archive.list_episodes().await?;

        let previous: Vec<DocumentEntry> =
            episodes.into_iter().filter(|e| e.id < target).collect();
        let previous_ids: Vec<String> = previous.iter().map(|e| e.id.clone()).collect();

        let mut known_characters = BTreeSet::new();
        let mut character_introductions = BTreeMap::new();
        let mut active_plot_arcs = BTreeSet::new();
        for entry in &previous {
            if let Some(introduced) = entry.metadata.get("characters_introduced").and_then(|v| v.as_array()) {
                for name in introduced.iter().filter_map(|v| v.as_str()) {
                    known_characters.insert(name.to_string());
                    character_introductions
                        .entry(name.to_string())
                        .or_insert_with(|| entry.id.clone());
                }
            }
            if let Some(arcs) = entry.metadata.get("plot_arcs").and_then(|v| v.as_array()) {
                for arc in arcs.iter().filter_map(|v| v.as_str()) {
                    active_plot_arcs.insert(arc.to_string());
                }
            }
        }

        let mut known_relationships = Vec::new();
        for entry in self.archive.scan(Collection::Relationships, None, usize::MAX).await? {
            let Some(first) = entry.meta_str("first_interaction") else { continue };
            if previous_ids.iter().any(|id| id == first) {
                known_relationships.push(KnownRelationship {
                    character1: entry.meta_str("character1").unwrap_or_default().to_string(),
                    character2: entry.meta_str("character2").unwrap_or_default().to_string(),
                    relationship_type: entry
                        .meta_str("relationship_type")
                        .unwrap_or("unknown")
                        .to_string(),
                    established_in: first.to_string(),
                });
            }
        }

        Ok(EpisodeContext {
            target_episode: target,
            total_previous_episodes: previous_ids.len(),
            previous_episodes: previous_ids,
            known_characters: known_characters.into_iter().collect(),
            character_introductions,
            known_relationships,
            active_plot_arcs: active_plot_arcs.into_iter().collect(),
        })
    }

    /// Track clues and resolution of a mystery by semantic event search.
    pub async fn track_mystery(&self, description: &str) -> Result<MysteryReport, AgentError> {
        validate_query(description)?;
        let hits = self.archive.query(Collection::PlotEvents, description, 20, None).await?;

        let mut clues = Vec::new();
        let mut resolutions = Vec::new();
        let mut related = Vec::new();
        for hit in &hits {
            let brief = EventBrief::from_entry(&hit.entry);
            match hit.entry.meta_str("event_type") {
                Some("mystery_clue") => clues.push(brief),
                Some("mystery_resolution") => resolutions.push(brief),
                _ if brief.mystery_elements.is_some() => related.push(brief),
                _ => {}
            }
        }

        for list in [&mut clues, &mut resolutions, &mut related] {
            list.sort_by(|a, b| a.episode_id.cmp(&b.episode_id));
        }

        Ok(MysteryReport {
            mystery: description.to_string(),
            total_clues: clues.len(),
            total_resolutions: resolutions.len(),
            is_resolved: !resolutions.is_empty(),
            clues,
            resolutions,
            related_events: related,
        })
    }

    /// Search across all five collections, `n_results` per collection.
    pub async fn search_all(&self, query: &str, n_results: usize) -> Result<CrossCollectionResults, AgentError> {
        validate_query(query)?;
        let mut hits = BTreeMap::new();
        for collection in Collection::ALL {
            let results = self.archive.query(collection, query, n_results, None).await?;
            hits.insert(
                collection.to_string(),
                results.iter().map(SearchHit::from_hit).collect(),
            );
        }
        Ok(CrossCollectionResults { query: query.to_string(), hits })
    }

    async fn relationships_for(&self, name: &str) -> Result<Vec<RelationshipBrief>, AgentError> {
        let entries = self.archive.scan(Collection::Relationships, None, usize::MAX).await?;
        let mut briefs: Vec<RelationshipBrief> = entries
            .iter()
            .filter_map(|entry| {
                let record: Relationship =
                    serde_json::from_value(entry.metadata.get("record")?.clone()).ok()?;
                let other = record.other_character(name)?.to_string();
                Some(RelationshipBrief {
                    other_character: other,
                    relationship_type: record.relationship_type.to_string(),
                    current_status: record.current_status.to_string(),
                    first_interaction: record.first_interaction.clone(),
                    importance_score: record.importance_score,
                    emotional_intensity: record.emotional_intensity,
                })
            })
            .collect();
        briefs.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(briefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::BoxLlmProvider;
    use crate::store::{BoxEmbedder, BoxVectorStore};
    use crate::testing::{MockProvider, StubEmbedder, StubStore};
    use lorekeep_types::character::Character;
    use lorekeep_types::episode::{Episode, EpisodeInfo};
    use lorekeep_types::event::{EventType, PlotEvent};
    use lorekeep_types::scene::Scene;

    fn interface() -> (QueryInterface, Arc<SeriesArchive>) {
        let archive = Arc::new(SeriesArchive::new(
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
        ));
        let provider = Arc::new(BoxLlmProvider::new(MockProvider::new(vec![])));
        let generator = SummaryGenerator::new(archive.clone(), provider, 0.1);
        (QueryInterface::new(archive.clone(), generator), archive)
    }

    async fn seed(archive: &SeriesArchive) {
        let mut episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "transcript");
        episode.add_character("Alice");
        episode.add_character("Bob");
        episode.add_plot_arc("the letter");
        archive.add_episode(&episode).await.unwrap();

        let mut episode2 = Episode::new(EpisodeInfo::new(1, 2, "Fallout"), "transcript");
        episode2.add_character("Carol");
        archive.add_episode(&episode2).await.unwrap();

        let mut alice = Character::new("Alice");
        alice.add_appearance("S01E01");
        archive.add_character(&alice).await.unwrap();

        let mut rel = Relationship::new("Alice", "Bob");
        rel.first_interaction = Some("S01E01".to_string());
        archive.add_relationship(&rel).await.unwrap();

        let mut scene = Scene::new("S01E01", 1, "Alice and Bob argue about the letter");
        scene.summary = Some("The argument".to_string());
        scene.add_character("Alice");
        scene.add_character("Bob");
        archive.add_scene(&scene).await.unwrap();

        let mut clue = PlotEvent::new("e1", "The letter", "An unsigned letter arrives", "S01E01");
        clue.event_type = EventType::MysteryClue;
        clue.plot_arc = Some("the letter".to_string());
        archive.add_plot_event(&clue).await.unwrap();
    }

    #[tokio::test]
    async fn test_character_profile_found() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let profile = interface.character_profile("Alice").await.unwrap();
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.total_appearances, 1);
        assert_eq!(profile.relationships.len(), 1);
        assert_eq!(profile.relationships[0].other_character, "Bob");
    }

    #[tokio::test]
    async fn test_character_profile_missing_is_not_found() {
        let (interface, _archive) = interface();
        let result = interface.character_profile("Nobody").await;
        assert!(matches!(
            result,
            Err(AgentError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_relationship_history_symmetry() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let ab = interface.relationship_history("Alice", "Bob").await.unwrap();
        let ba = interface.relationship_history("Bob", "Alice").await.unwrap();
        assert_eq!(ab.character1, ba.character1);
        assert_eq!(ab.character2, ba.character2);
        assert_eq!(ab.relationship_type, ba.relationship_type);
        assert_eq!(ab.first_interaction, ba.first_interaction);
    }

    #[tokio::test]
    async fn test_find_scene_validates_query() {
        let (interface, _archive) = interface();
        assert!(matches!(
            interface.find_scene("", 5).await,
            Err(AgentError::Validation(_))
        ));
        assert!(matches!(
            interface.find_scene("x", 5).await,
            Err(AgentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_find_scene_returns_ranked_matches() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let results = interface.find_scene("argue about the letter", 5).await.unwrap();
        assert_eq!(results.total_results, 1);
        assert_eq!(results.results[0].scene_id, "S01E01_S001");
        assert_eq!(results.results[0].characters, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_episode_context_is_strictly_prior() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let context = interface.episode_context(1, 2).await.unwrap();
        assert_eq!(context.target_episode, "S01E02");
        assert_eq!(context.previous_episodes, vec!["S01E01"]);
        assert_eq!(context.known_characters, vec!["Alice", "Bob"]);
        assert_eq!(context.character_introductions["Alice"], "S01E01");
        assert_eq!(context.known_relationships.len(), 1);
        assert_eq!(context.active_plot_arcs, vec!["the letter"]);

        // Before the first episode nothing is known.
        let context = interface.episode_context(1, 1).await.unwrap();
        assert!(context.previous_episodes.is_empty());
        assert!(context.known_characters.is_empty());
    }

    #[tokio::test]
    async fn test_track_mystery_partitions_events() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let mut resolution =
            PlotEvent::new("e2", "The author revealed", "Bob wrote the letter", "S01E02");
        resolution.event_type = EventType::MysteryResolution;
        archive.add_plot_event(&resolution).await.unwrap();

        let report = interface.track_mystery("who wrote the letter").await.unwrap();
        assert_eq!(report.total_clues, 1);
        assert_eq!(report.total_resolutions, 1);
        assert!(report.is_resolved);
    }

    #[tokio::test]
    async fn test_search_all_covers_every_collection() {
        let (interface, archive) = interface();
        seed(&archive).await;

        let results = interface.search_all("letter", 3).await.unwrap();
        assert_eq!(results.hits.len(), 5);
        assert!(results.hits.contains_key("episodes"));
        assert!(results.hits.contains_key("plot_events"));
        assert!(!results.hits["scenes"].is_empty());
    }
}
