//! Plot event extraction.
//!
//! One JSON-array call per scene. Entries missing a title or description
//! are dropped; everything else gets conservative defaults.

use std::sync::Arc;

use serde::Deserialize;

use lorekeep_types::error::ExtractError;
use lorekeep_types::event::{EventImportance, EventType, PlotEvent};

use crate::llm::BoxLlmProvider;

use super::json::{clamp_unit, complete_json, OneOrMany};
use super::prompts;
use super::{ExtractionContext, Extractor, Record};

/// Raw plot event as returned by the LLM.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlotEvent {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    importance: Option<String>,
    characters_involved: Vec<String>,
    plot_arc: Option<String>,
    themes: Vec<String>,
    emotional_impact: Option<f64>,
    plot_significance: Option<f64>,
    mystery_elements: Vec<String>,
    reveals_information: Vec<String>,
    questions_raised: Vec<String>,
    questions_answered: Vec<String>,
    foreshadowing_clues: Vec<String>,
    tags: Vec<String>,
}

/// Extracts plot events from scene content.
pub struct PlotEventExtractor {
    provider: Arc<BoxLlmProvider>,
    temperature: f64,
}

impl PlotEventExtractor {
    pub fn new(provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self { provider, temperature }
    }

    #[tracing::instrument(
        name = "extract_plot_events",
        skip(self, content, characters_present)
    )]
    pub async fn extract_for_scene(
        &self,
        content: &str,
        episode_id: &str,
        scene_id: Option<&str>,
        characters_present: &[String],
    ) -> Result<Vec<PlotEvent>, ExtractError> {
        let user = prompts::plot_events_user(episode_id, scene_id, content);
        let raw: OneOrMany<RawPlotEvent> = complete_json(
            &self.provider,
            prompts::PLOT_EVENTS_SYSTEM,
            &user,
            self.temperature,
            "PlotEvents",
        )
        .await?;

        let id_base = scene_id.unwrap_or(episode_id);
        let events: Vec<PlotEvent> = raw
            .into_vec()
            .into_iter()
            .filter_map(|e| build_event(e, episode_id, scene_id, id_base, characters_present))
            .enumerate()
            .map(|(i, mut event)| {
                event.id = PlotEvent::event_id(id_base, i);
                event
            })
            .collect();

        tracing::info!(episode_id, count = events.len(), "extracted plot events");
        Ok(events)
    }
}

fn build_event(
    raw: RawPlotEvent,
    episode_id: &str,
    scene_id: Option<&str>,
    id_base: &str,
    characters_present: &[String],
) -> Option<PlotEvent> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let description = raw.description.filter(|d| !d.trim().is_empty())?;

    let mut event = PlotEvent::new(id_base, title, description, episode_id);
    event.scene_id = scene_id.map(str::to_string);
    event.event_type = raw
        .event_type
        .and_then(|t| t.trim().parse::<EventType>().ok())
        .unwrap_or_default();
    event.importance = raw
        .importance
        .and_then(|i| i.trim().parse::<EventImportance>().ok())
        .unwrap_or_default();
    event.characters_involved = if raw.characters_involved.is_empty() {
        characters_present.to_vec()
    } else {
        raw.characters_involved
    };
    event.plot_arc = raw.plot_arc.filter(|a| !a.trim().is_empty());
    event.themes = raw.themes;
    event.emotional_impact = clamp_unit(raw.emotional_impact.unwrap_or(0.5));
    event.plot_significance = clamp_unit(raw.plot_significance.unwrap_or(0.5));
    event.mystery_elements = raw.mystery_elements;
    event.reveals_information = raw.reveals_information;
    event.questions_raised = raw.questions_raised;
    event.questions_answered = raw.questions_answered;
    event.foreshadowing_clues = raw.foreshadowing_clues;
    event.tags = raw.tags;
    Some(event)
}

impl Extractor for PlotEventExtractor {
    fn name(&self) -> &str {
        "plot_event_extractor"
    }

    async fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> Result<Vec<Record>, ExtractError> {
        let events = self
            .extract_for_scene(
                content,
                &context.episode_id,
                context.scene_id.as_deref(),
                &context.characters_present,
            )
            .await?;
        Ok(events.into_iter().map(Record::Event).collect())
    }
}
