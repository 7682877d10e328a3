//! Scene segmentation.
//!
//! Two LLM passes: first the transcript is split on `---SCENE_BREAK---`
//! markers (falling back to a single scene when the model returns no
//! breaks), then each segment is analyzed into a structured [`Scene`].

use std::sync::Arc;

use serde::Deserialize;

use lorekeep_types::error::ExtractError;
use lorekeep_types::scene::{EmotionalTone, Scene};

use crate::llm::BoxLlmProvider;

use super::json::{clamp_unit, complete_json, complete_text};
use super::prompts;
use super::{ExtractionContext, Extractor, Record};

/// Raw scene analysis as returned by the LLM.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSceneAnalysis {
    summary: Option<String>,
    location: Option<String>,
    time_of_day: Option<String>,
    characters_present: Vec<String>,
    key_dialogue: Vec<String>,
    plot_events: Vec<String>,
    character_developments: Vec<String>,
    relationship_dynamics: Vec<String>,
    emotional_tone: Vec<String>,
    mood_description: Option<String>,
    plot_relevance: Option<f64>,
    foreshadowing: Vec<String>,
    callbacks: Vec<String>,
    importance_score: Option<f64>,
    themes: Vec<String>,
}

/// Segments episode transcripts into analyzed scenes.
pub struct SceneSegmenter {
    provider: Arc<BoxLlmProvider>,
    temperature: f64,
}

impl SceneSegmenter {
    pub fn new(provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self { provider, temperature }
    }

    /// Segment a transcript into scenes for an episode.
    #[tracing::instrument(name = "segment_scenes", skip(self, transcript))]
    pub async fn segment(&self, transcript: &str, episode_id: &str) -> Result<Vec<Scene>, ExtractError> {
        let segments = self.identify_scene_breaks(transcript).await;

        let mut scenes = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let scene_number = (i + 1) as u32;
            let analysis = self.analyze_scene(segment, scene_number, episode_id).await?;
            scenes.push(build_scene(episode_id, scene_number, segment, analysis));
        }

        tracing::info!(episode_id, scene_count = scenes.len(), "segmented transcript");
        Ok(scenes)
    }

    /// Ask the LLM for scene breaks; on failure the transcript is treated
    /// as a single scene.
    async fn identify_scene_breaks(&self, transcript: &str) -> Vec<String> {
        let user = prompts::scene_break_user(transcript);
        match complete_text(&self.provider, prompts::SCENE_BREAK_SYSTEM, &user, self.temperature).await
        {
            Ok(response) => {
                let segments: Vec<String> = response
                    .split(prompts::SCENE_BREAK_MARKER)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if segments.is_empty() {
                    vec![transcript.to_string()]
                } else {
                    segments
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "scene break identification failed, using single scene");
                vec![transcript.to_string()]
            }
        }
    }

    async fn analyze_scene(
        &self,
        content: &str,
        scene_number: u32,
        episode_id: &str,
    ) -> Result<RawSceneAnalysis, ExtractError> {
        let user = prompts::scene_analysis_user(episode_id, scene_number, content);
        complete_json(
            &self.provider,
            prompts::SCENE_ANALYSIS_SYSTEM,
            &user,
            self.temperature,
            "SceneAnalysis",
        )
        .await
    }
}

fn build_scene(episode_id: &str, scene_number: u32, content: &str, raw: RawSceneAnalysis) -> Scene {
    let mut scene = Scene::new(episode_id, scene_number, content);
    scene.summary = raw.summary.filter(|s| !s.trim().is_empty());
    scene.location = raw.location;
    scene.time_of_day = raw.time_of_day;
    scene.characters_present = raw.characters_present;
    scene.key_dialogue = raw.key_dialogue;
    scene.character_developments = raw.character_developments;
    scene.relationship_dynamics = raw.relationship_dynamics;
    // Unknown tone strings from the model are dropped, not errors.
    scene.emotional_tone = raw
        .emotional_tone
        .iter()
        .filter_map(|t| t.trim().parse::<EmotionalTone>().ok())
        .collect();
    scene.mood_description = raw.mood_description;
    scene.plot_relevance = clamp_unit(raw.plot_relevance.unwrap_or(0.5));
    scene.foreshadowing = raw.foreshadowing;
    scene.callbacks = raw.callbacks;
    scene.importance_score = clamp_unit(raw.importance_score.unwrap_or(0.5));
    scene.themes = raw.themes;
    scene
}

impl Extractor for SceneSegmenter {
    fn name(&self) -> &str {
        "scene_segmenter"
    }

    async fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> Result<Vec<Record>, ExtractError> {
        let scenes = self.segment(content, &context.episode_id).await?;
        Ok(scenes.into_iter().map(Record::Scene).collect())
    }
}
