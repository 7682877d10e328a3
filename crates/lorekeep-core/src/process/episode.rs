//! The per-episode pipeline: `Received -> Segmented -> Extracted ->
//! Persisted -> Summarized`.
//!
//! Stages are sequential and non-reentrant. Scene extraction runs strictly
//! scene-by-scene because character de-duplication depends on the names
//! accumulated from earlier scenes. All extraction output is buffered in
//! memory and only persisted once every scene has extracted successfully --
//! a failure anywhere aborts the episode without partial commits.

use std::fmt;
use std::sync::Arc;

use lorekeep_types::character::Character;
use lorekeep_types::episode::{Episode, EpisodeInfo};
use lorekeep_types::error::{AgentError, ValidationError};
use lorekeep_types::event::{EventImportance, PlotEvent};
use lorekeep_types::relationship::Relationship;
use lorekeep_types::scene::Scene;

use crate::archive::SeriesArchive;
use crate::extract::{
    CharacterExtractor, ExtractionContext, ExtractorRegistry, PlotEventExtractor, Record,
    RelationshipExtractor, SceneSegmenter,
};
use crate::llm::BoxLlmProvider;

/// Minimum transcript length for meaningful processing.
const MIN_TRANSCRIPT_CHARS: usize = 100;

/// Upper bound to keep a single episode tractable.
const MAX_TRANSCRIPT_CHARS: usize = 1_000_000;

/// Pipeline stage for one episode. Non-reentrant, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Received,
    Segmented,
    Extracted,
    Persisted,
    Summarized,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Received => "received",
            PipelineStage::Segmented => "segmented",
            PipelineStage::Extracted => "extracted",
            PipelineStage::Persisted => "persisted",
            PipelineStage::Summarized => "summarized",
        };
        write!(f, "{s}")
    }
}

pub fn validate_transcript(transcript: &str) -> Result<(), ValidationError> {
    let trimmed = transcript.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTranscript);
    }
    if trimmed.len() < MIN_TRANSCRIPT_CHARS {
        return Err(ValidationError::TranscriptTooShort {
            min: MIN_TRANSCRIPT_CHARS,
            got: trimmed.len(),
        });
    }
    if transcript.len() > MAX_TRANSCRIPT_CHARS {
        return Err(ValidationError::TranscriptTooLong {
            max: MAX_TRANSCRIPT_CHARS,
            got: transcript.len(),
        });
    }
    Ok(())
}

/// Drives an episode through the full analysis pipeline.
pub struct EpisodeProcessor {
    archive: Arc<SeriesArchive>,
    segmenter: SceneSegmenter,
    characters: CharacterExtractor,
    relationships: RelationshipExtractor,
    events: PlotEventExtractor,
    registry: ExtractorRegistry,
}

impl EpisodeProcessor {
    pub fn new(archive: Arc<SeriesArchive>, provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self {
            archive,
            segmenter: SceneSegmenter::new(provider.clone(), temperature),
            characters: CharacterExtractor::new(provider.clone(), temperature),
            relationships: RelationshipExtractor::new(provider.clone(), temperature),
            events: PlotEventExtractor::new(provider, temperature),
            registry: ExtractorRegistry::new(),
        }
    }

    /// Additional extractors run per scene after the built-ins.
    pub fn registry_mut(&mut self) -> &mut ExtractorRegistry {
        &mut self.registry
    }

    /// Process a complete episode. Returns the stored [`Episode`].
    #[tracing::instrument(
        name = "process_episode",
        skip(self, transcript, info),
        fields(episode_id = tracing::field::Empty)
    )]
    pub async fn process(&self, transcript: &str, info: EpisodeInfo) -> Result<Episode, AgentError> {
        info.validate()?;
        validate_transcript(transcript)?;

        let episode_id = info.episode_id();
        tracing::Span::current().record("episode_id", episode_id.as_str());
        let mut stage = PipelineStage::Received;
        tracing::info!(%stage, title = %info.title, "processing episode");

        let mut episode = Episode::new(info, transcript);

        // Re-ingesting replaces the old episode and its scenes.
        if self.archive.get_episode(&episode_id).await?.is_some() {
            tracing::warn!(%episode_id, "episode already exists, replacing");
            self.archive.delete_episode(&episode_id).await?;
        }

        let mut scenes = self.segmenter.segment(transcript, &episode_id).await?;
        stage = PipelineStage::Segmented;
        tracing::info!(%stage, scene_count = scenes.len(), "scenes segmented");

        // Extraction buffers; nothing is persisted until all scenes succeed.
        let mut characters: Vec<Character> = Vec::new();
        let mut known_names: Vec<String> = Vec::new();
        let mut relationships: Vec<Relationship> = Vec::new();
        let mut events: Vec<PlotEvent> = Vec::new();

        for scene in &scenes {
            let new_characters = self
                .characters
                .extract_new(&scene.content, &episode_id, &known_names)
                .await?;
            for character in new_characters {
                known_names.push(character.name.clone());
                episode.add_character(character.name.clone());
                characters.push(character);
            }
        }

        for scene in &scenes {
            let scene_relationships = self
                .relationships
                .extract_for_scene(&scene.content, &episode_id, &scene.characters_present)
                .await?;
            for rel in scene_relationships {
                if !relationships.iter().any(|existing| existing.id == rel.id) {
                    relationships.push(rel);
                }
            }
        }

        for scene in &mut scenes {
            let scene_events = self
                .events
                .extract_for_scene(
                    &scene.content,
                    &episode_id,
                    Some(&scene.id),
                    &scene.characters_present,
                )
                .await?;
            for event in scene_events {
                scene.add_plot_event(event.id.clone());
                if let Some(arc) = &event.plot_arc {
                    episode.add_plot_arc(arc.clone());
                }
                events.push(event);
            }
        }

        for scene in &scenes {
            let context = ExtractionContext {
                episode_id: episode_id.clone(),
                scene_id: Some(scene.id.clone()),
                characters_present: scene.characters_present.clone(),
                known_characters: known_names.clone(),
            };
            for extractor in self.registry.iter() {
                let records = extractor.extract(&scene.content, &context).await?;
                for record in records {
                    match record {
                        Record::Character(c) => {
                            if !known_names.contains(&c.name) {
                                known_names.push(c.name.clone());
                                episode.add_character(c.name.clone());
                                characters.push(c);
                            }
                        }
                        Record::Relationship(r) => {
                            if !relationships.iter().any(|existing| existing.id == r.id) {
                                relationships.push(r);
                            }
                        }
                        Record::Event(e) => events.push(e),
                        Record::Scene(_) => {
                            tracing::warn!(
                                extractor = extractor.name(),
                                "custom extractors cannot emit scenes, record dropped"
                            );
                        }
                    }
                }
            }
        }

        stage = PipelineStage::Extracted;
        tracing::info!(
            %stage,
            characters = characters.len(),
            relationships = relationships.len(),
            events = events.len(),
            "extraction complete"
        );

        for character in &characters {
            self.archive.add_character(character).await?;
        }
        for relationship in &relationships {
            self.archive.add_relationship(relationship).await?;
        }
        for event in &events {
            self.archive.add_plot_event(event).await?;
        }
        for scene in &scenes {
            self.archive.add_scene(scene).await?;
            episode.add_scene(scene.id.clone());
        }
        stage = PipelineStage::Persisted;
        tracing::info!(%stage, "records persisted");

        episode.summary = Some(compose_digest(&episode, &scenes, &events));
        episode.importance_score = episode_importance(&scenes, &events);
        self.archive.add_episode(&episode).await?;
        stage = PipelineStage::Summarized;
        tracing::info!(%stage, scene_count = episode.scenes.len(), "episode complete");

        Ok(episode)
    }
}

/// Non-LLM digest stored with the episode: scene summaries plus major
/// events. The on-demand generator produces the prose version.
fn compose_digest(episode: &Episode, scenes: &[Scene], events: &[PlotEvent]) -> String {
    let scene_summaries: Vec<&str> = scenes
        .iter()
        .filter_map(|s| s.summary.as_deref())
        .take(5)
        .collect();
    let major_events: Vec<&str> = events
        .iter()
        .filter(|e| matches!(e.importance, EventImportance::Critical | EventImportance::High))
        .map(|e| e.description.as_str())
        .take(5)
        .collect();

    if scene_summaries.is_empty() && major_events.is_empty() {
        return format!("Episode {}: {}", episode.id, episode.info.title);
    }

    let mut parts = Vec::new();
    if !scene_summaries.is_empty() {
        let lines: Vec<String> = scene_summaries.iter().map(|s| format!("- {s}")).collect();
        parts.push(format!("Scene Summary:\n{}", lines.join("\n")));
    }
    if !major_events.is_empty() {
        let lines: Vec<String> = major_events.iter().map(|e| format!("- {e}")).collect();
        parts.push(format!("Major Events:\n{}", lines.join("\n")));
    }
    parts.join("\n\n")
}

/// Episode importance: 0.3 x mean scene importance + 0.7 x event weight,
/// where critical events count 1.0 and high events 0.8.
fn episode_importance(scenes: &[Scene], events: &[PlotEvent]) -> f32 {
    if scenes.is_empty() && events.is_empty() {
        return 0.5;
    }

    let scene_importance = if scenes.is_empty() {
        0.5
    } else {
        scenes.iter().map(|s| s.importance_score).sum::<f32>() / scenes.len() as f32
    };

    let event_importance = if events.is_empty() {
        0.5
    } else {
        let critical = events.iter().filter(|e| e.importance == EventImportance::Critical).count();
        let high = events.iter().filter(|e| e.importance == EventImportance::High).count();
        ((critical as f32 * 1.0 + high as f32 * 0.8) / events.len() as f32).min(1.0)
    };

    scene_importance * 0.3 + event_importance * 0.7
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxEmbedder, BoxVectorStore};
    use crate::testing::{MockProvider, StubEmbedder, StubStore};
    use lorekeep_types::search::Collection;

    const SCENE_ONE_ANALYSIS: &str = r#"{
        "summary": "Alice confronts Bob about the unsigned letter.",
        "location": "Kitchen",
        "characters_present": ["Alice", "Bob"],
        "emotional_tone": ["tense"],
        "plot_relevance": 0.9,
        "importance_score": 0.8
    }"#;

    const SCENE_TWO_ANALYSIS: &str = r#"{
        "summary": "Bob burns the letter and leaves.",
        "location": "Back yard",
        "characters_present": ["Alice", "Bob"],
        "emotional_tone": ["mysterious"],
        "importance_score": 0.6
    }"#;

    const ALICE_DETAILS: &str =
        r#"{"role": "protagonist", "personality_traits": ["determined"], "importance_score": 0.9}"#;
    const BOB_DETAILS: &str =
        r#"{"role": "supporting", "personality_traits": ["evasive"], "importance_score": 0.6}"#;

    const REL_DETAILS: &str = r#"{
        "type": "complicated",
        "status": "strained",
        "description": "Allies with a widening rift",
        "importance_score": 0.7,
        "emotional_intensity": 0.8
    }"#;

    const SCENE_ONE_EVENTS: &str = r#"[{
        "title": "The confrontation",
        "description": "Alice confronts Bob over the letter",
        "type": "conflict_introduction",
        "importance": "high",
        "characters_involved": ["Alice", "Bob"],
        "plot_arc": "the letter"
    }]"#;

    fn transcript() -> String {
        "INT. KITCHEN - NIGHT. ALICE: You wrote this, didn't you? BOB: I have no idea what \
         you're talking about. EXT. BACK YARD - LATER. Bob burns a letter in the fire pit."
            .to_string()
    }

    fn processor(responses: Vec<&str>) -> (EpisodeProcessor, Arc<SeriesArchive>) {
        let archive = Arc::new(SeriesArchive::new(
            BoxVectorStore::new(StubStore::new()),
            BoxEmbedder::new(StubEmbedder),
        ));
        let provider = Arc::new(BoxLlmProvider::new(MockProvider::new(responses)));
        (EpisodeProcessor::new(archive.clone(), provider, 0.1), archive)
    }

    /// Two-scene confrontation transcript: one Character record per name,
    /// one Relationship for the pair, at least one PlotEvent tagged to the
    /// scene.
    #[tokio::test]
    async fn test_two_scene_confrontation_pipeline() {
        let (processor, archive) = processor(vec![
            // segmentation: split + per-scene analysis
            "INT. KITCHEN - NIGHT ...---SCENE_BREAK---EXT. BACK YARD - LATER ...",
            SCENE_ONE_ANALYSIS,
            SCENE_TWO_ANALYSIS,
            // characters: scene 1 identify + details, scene 2 identify (all known)
            "Alice\nBob",
            ALICE_DETAILS,
            BOB_DETAILS,
            "Alice\nBob",
            // relationships: pairs + details per scene (scene 2 duplicate dropped)
            "Alice | Bob",
            REL_DETAILS,
            "Alice | Bob",
            REL_DETAILS,
            // plot events per scene
            SCENE_ONE_EVENTS,
            "[]",
        ]);

        let episode = processor
            .process(&transcript(), EpisodeInfo::new(1, 1, "The Letter"))
            .await
            .unwrap();

        // Scene count matches segmentation output.
        assert_eq!(episode.scenes, vec!["S01E01_S001", "S01E01_S002"]);
        // Digest summary is non-empty.
        assert!(episode.summary.as_deref().is_some_and(|s| !s.is_empty()));
        assert!(episode.summary.as_deref().unwrap().contains("Scene Summary:"));
        // One character per name, no duplicates.
        assert_eq!(episode.characters_introduced, vec!["Alice", "Bob"]);
        // Arc tag propagated from the event.
        assert_eq!(episode.plot_arcs, vec!["the letter"]);

        let counts = archive.counts().await.unwrap();
        assert_eq!(counts["episodes"], 1);
        assert_eq!(counts["scenes"], 2);
        assert_eq!(counts["characters"], 2);
        assert_eq!(counts["relationships"], 1);
        assert_eq!(counts["plot_events"], 1);

        // The event is tagged to its scene, and the scene links back.
        let events = archive.scan(Collection::PlotEvents, None, 10).await.unwrap();
        assert_eq!(events[0].meta_str("scene_id"), Some("S01E01_S001"));
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_nothing_persisted() {
        // Scene 1 analysis is malformed twice: parse error after the single
        // stricter retry, pipeline aborts before any persistence.
        let (processor, archive) = processor(vec![
            "scene one---SCENE_BREAK---scene two",
            "not json at all",
            "still not json",
        ]);

        let result = processor
            .process(&transcript(), EpisodeInfo::new(1, 2, "Doomed"))
            .await;
        assert!(result.is_err());

        for (_, count) in archive.counts().await.unwrap() {
            assert_eq!(count, 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_transcript_rejected_before_any_llm_call() {
        let (processor, _archive) = processor(vec![]);
        let result = processor
            .process("too short", EpisodeInfo::new(1, 1, "Pilot"))
            .await;
        assert!(matches!(
            result,
            Err(AgentError::Validation(ValidationError::TranscriptTooShort { .. }))
        ));
    }

    #[test]
    fn test_validate_transcript_bounds() {
        assert!(validate_transcript("").is_err());
        assert!(validate_transcript(&"x".repeat(99)).is_err());
        assert!(validate_transcript(&"x".repeat(100)).is_ok());
        assert!(validate_transcript(&"x".repeat(1_000_001)).is_err());
    }

    #[test]
    fn test_episode_importance_weights_events() {
        let mut scene = Scene::new("S01E01", 1, "content");
        scene.importance_score = 1.0;

        let mut critical = PlotEvent::new("e1", "t", "d", "S01E01");
        critical.importance = EventImportance::Critical;
        let mut low = PlotEvent::new("e2", "t", "d", "S01E01");
        low.importance = EventImportance::Low;

        // scene avg 1.0 * 0.3 + event weight (1.0 / 2) * 0.7 = 0.65
        let score = episode_importance(&[scene], &[critical, low]);
        assert!((score - 0.65).abs() < 1e-6);

        assert_eq!(episode_importance(&[], &[]), 0.5);
    }

    #[test]
    fn test_compose_digest_fallback() {
        let episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "t");
        let digest = compose_digest(&episode, &[], &[]);
        assert_eq!(digest, "Episode S01E01: Pilot");
    }
}
