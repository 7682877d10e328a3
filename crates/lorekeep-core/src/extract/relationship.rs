//! Relationship extraction.
//!
//! Identifies interacting character pairs (`A | B` lines validated against
//! the characters present), then extracts details per pair. Pair ids are
//! order-independent, so A-B and B-A converge on the same record.

use std::sync::Arc;

use serde::Deserialize;

use lorekeep_types::error::ExtractError;
use lorekeep_types::relationship::{Relationship, RelationshipStatus, RelationshipType};

use crate::llm::BoxLlmProvider;

use super::json::{clamp_unit, complete_json, complete_text};
use super::prompts;
use super::{ExtractionContext, Extractor, Record};

/// Raw relationship details as returned by the LLM.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRelationshipDetails {
    #[serde(rename = "type")]
    relationship_type: Option<String>,
    status: Option<String>,
    description: Option<String>,
    how_they_met: Option<String>,
    dynamic: Option<String>,
    key_dialogue: Vec<String>,
    importance_score: Option<f64>,
    emotional_intensity: Option<f64>,
}

impl RawRelationshipDetails {
    /// An entirely empty object means the model found nothing worth keeping.
    fn is_empty(&self) -> bool {
        self.relationship_type.is_none()
            && self.status.is_none()
            && self.description.is_none()
            && self.dynamic.is_none()
    }
}

/// Extracts relationships between characters from scene content.
pub struct RelationshipExtractor {
    provider: Arc<BoxLlmProvider>,
    temperature: f64,
}

impl RelationshipExtractor {
    pub fn new(provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self { provider, temperature }
    }

    /// Extract relationships for one scene. Needs at least two characters
    /// present; returns an empty list otherwise.
    #[tracing::instrument(
        name = "extract_relationships",
        skip(self, content, characters_present)
    )]
    pub async fn extract_for_scene(
        &self,
        content: &str,
        episode_id: &str,
        characters_present: &[String],
    ) -> Result<Vec<Relationship>, ExtractError> {
        if characters_present.len() < 2 {
            return Ok(Vec::new());
        }

        let pairs = self.identify_pairs(content, characters_present).await?;

        let mut relationships = Vec::new();
        for (char1, char2) in pairs {
            let details: Option<RawRelationshipDetails> =
                self.extract_details(content, &char1, &char2).await?;
            let Some(details) = details.filter(|d| !d.is_empty()) else {
                continue;
            };
            relationships.push(build_relationship(char1, char2, episode_id, details));
        }

        tracing::info!(episode_id, count = relationships.len(), "extracted relationships");
        Ok(relationships)
    }

    /// Parse `A | B` lines, keeping only pairs of distinct characters from
    /// the provided list. Pairs are normalized to sorted order and deduped.
    async fn identify_pairs(
        &self,
        content: &str,
        characters: &[String],
    ) -> Result<Vec<(String, String)>, ExtractError> {
        let user = prompts::relationship_pairs_user(characters, content);
        let response = complete_text(
            &self.provider,
            prompts::RELATIONSHIP_PAIRS_SYSTEM,
            &user,
            self.temperature,
        )
        .await?;

        let mut pairs: Vec<(String, String)> = Vec::new();
        for line in response.lines() {
            let Some((left, right)) = line.split_once('|') else { continue };
            let char1 = left.trim().to_string();
            let char2 = right.trim().to_string();
            if char1 == char2
                || !characters.contains(&char1)
                || !characters.contains(&char2)
            {
                continue;
            }
            let pair = if char1 <= char2 { (char1, char2) } else { (char2, char1) };
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        Ok(pairs)
    }

    async fn extract_details(
        &self,
        content: &str,
        char1: &str,
        char2: &str,
    ) -> Result<Option<RawRelationshipDetails>, ExtractError> {
        let system = prompts::relationship_details_system(char1, char2);
        let user = prompts::relationship_details_user(char1, char2, content);
        complete_json(&self.provider, &system, &user, self.temperature, "RelationshipDetails").await
    }
}

fn build_relationship(
    char1: String,
    char2: String,
    episode_id: &str,
    raw: RawRelationshipDetails,
) -> Relationship {
    let mut rel = Relationship::new(char1, char2);
    rel.relationship_type = raw
        .relationship_type
        .and_then(|t| t.trim().parse::<RelationshipType>().ok())
        .unwrap_or_default();
    rel.current_status = raw
        .status
        .and_then(|s| s.trim().parse::<RelationshipStatus>().ok())
        .unwrap_or_default();
    rel.description = raw.description;
    rel.how_they_met = raw.how_they_met;
    rel.dynamic = raw.dynamic;
    rel.first_interaction = Some(episode_id.to_string());
    for dialogue in raw.key_dialogue {
        rel.add_dialogue(dialogue);
    }
    rel.importance_score = clamp_unit(raw.importance_score.unwrap_or(0.5));
    rel.emotional_intensity = clamp_unit(raw.emotional_intensity.unwrap_or(0.5));
    rel
}

impl Extractor for RelationshipExtractor {
    fn name(&self) -> &str {
        "relationship_extractor"
    }

    async fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> Result<Vec<Record>, ExtractError> {
        let relationships = self
            .extract_for_scene(content, &context.episode_id, &context.characters_present)
            .await?;
        Ok(relationships.into_iter().map(Record::Relationship).collect())
    }
}
