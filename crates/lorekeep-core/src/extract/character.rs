//! Character extraction.
//!
//! Two-phase: identify named characters (plain line list), then extract
//! details for each name not already known. Name matching is exact and
//! case-sensitive -- "alice" and "Alice" are different characters by design.

use std::sync::Arc;

use serde::Deserialize;

use lorekeep_types::character::{Character, CharacterRole};
use lorekeep_types::error::ExtractError;

use crate::llm::BoxLlmProvider;

use super::json::{clamp_unit, complete_json, complete_text};
use super::prompts;
use super::{ExtractionContext, Extractor, Record};

/// Raw character details as returned by the LLM.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCharacterDetails {
    aliases: Vec<String>,
    role: Option<String>,
    description: Option<String>,
    occupation: Option<String>,
    age: Option<String>,
    background: Option<String>,
    personality_traits: Vec<String>,
    skills_abilities: Vec<String>,
    goals_motivations: Vec<String>,
    fears_weaknesses: Vec<String>,
    character_arc: Option<String>,
    important_quotes: Vec<String>,
    importance_score: Option<f64>,
}

/// Extracts character profiles from scene content.
pub struct CharacterExtractor {
    provider: Arc<BoxLlmProvider>,
    temperature: f64,
}

impl CharacterExtractor {
    pub fn new(provider: Arc<BoxLlmProvider>, temperature: f64) -> Self {
        Self { provider, temperature }
    }

    /// Extract characters from `content` that are not in `known`.
    #[tracing::instrument(name = "extract_characters", skip(self, content, known))]
    pub async fn extract_new(
        &self,
        content: &str,
        episode_id: &str,
        known: &[String],
    ) -> Result<Vec<Character>, ExtractError> {
        let names = self.identify_characters(content).await?;

        let mut characters = Vec::new();
        for name in names {
            if known.contains(&name) {
                continue;
            }
            let details = self.extract_details(content, &name).await?;
            characters.push(build_character(name, episode_id, details));
        }

        tracing::info!(episode_id, count = characters.len(), "extracted new characters");
        Ok(characters)
    }

    async fn identify_characters(&self, content: &str) -> Result<Vec<String>, ExtractError> {
        let user = prompts::character_identify_user(content);
        let response = complete_text(
            &self.provider,
            prompts::CHARACTER_IDENTIFY_SYSTEM,
            &user,
            self.temperature,
        )
        .await?;
        Ok(parse_line_list(&response))
    }

    async fn extract_details(
        &self,
        content: &str,
        name: &str,
    ) -> Result<RawCharacterDetails, ExtractError> {
        let system = prompts::character_details_system(name);
        let user = prompts::character_details_user(name, content);
        complete_json(&self.provider, &system, &user, self.temperature, "CharacterDetails").await
    }
}

fn build_character(name: String, episode_id: &str, raw: RawCharacterDetails) -> Character {
    let mut character = Character::new(name);
    for alias in raw.aliases {
        character.add_alias(alias);
    }
    // Unknown roles fall back to the default (minor).
    character.role = raw
        .role
        .and_then(|r| r.trim().parse::<CharacterRole>().ok())
        .unwrap_or_default();
    character.description = raw.description;
    character.occupation = raw.occupation;
    character.age = raw.age;
    character.background = raw.background;
    character.personality_traits = raw.personality_traits;
    character.skills_abilities = raw.skills_abilities;
    character.goals_motivations = raw.goals_motivations;
    character.fears_weaknesses = raw.fears_weaknesses;
    character.character_arc = raw.character_arc;
    character.important_quotes = raw.important_quotes;
    character.importance_score = clamp_unit(raw.importance_score.unwrap_or(0.5));
    character.add_appearance(episode_id);
    character
}

/// Parse a line-list response: strip bullets and numbering, skip headings,
/// deduplicate preserving order.
fn parse_line_list(response: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in response.lines() {
        let clean = line
            .trim_start_matches(|c: char| {
                c.is_whitespace() || c.is_ascii_digit() || matches!(c, '-' | '*' | '.' | ')')
            })
            .trim();
        if clean.is_empty() || clean.starts_with('#') {
            continue;
        }
        let clean = clean.to_string();
        if !items.contains(&clean) {
            items.push(clean);
        }
    }
    items
}

impl Extractor for CharacterExtractor {
    fn name(&self) -> &str {
        "character_extractor"
    }

    async fn extract(
        &self,
        content: &str,
        context: &ExtractionContext,
    ) -> Result<Vec<Record>, ExtractError> {
        let characters = self
            .extract_new(content, &context.episode_id, &context.known_characters)
            .await?;
        Ok(characters.into_iter().map(Record::Character).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;

    const ALICE_DETAILS: &str = r#"{
        "aliases": ["Al"],
        "role": "protagonist",
        "occupation": "detective",
        "age": "34",
        "personality_traits": ["stubborn", "loyal"],
        "goals_motivations": ["find the truth"],
        "importance_score": 0.9
    }"#;

    const BOB_DETAILS: &str = r#"{
        "role": "archvillain",
        "personality_traits": ["secretive"],
        "importance_score": 0.7
    }"#;

    fn extractor(responses: Vec<&str>) -> CharacterExtractor {
        CharacterExtractor::new(Arc::new(BoxLlmProvider::new(MockProvider::new(responses))), 0.1)
    }

    #[test]
    fn test_parse_line_list_strips_bullets_and_numbering() {
        let response = "- Alice\n* Bob\n1. Carol\n2) Dave\n\n# Notes\nAlice";
        assert_eq!(parse_line_list(response), vec!["Alice", "Bob", "Carol", "Dave"]);
    }

    #[tokio::test]
    async fn test_extracts_details_for_new_characters_only() {
        let ex = extractor(vec!["Alice\nBob", ALICE_DETAILS, BOB_DETAILS]);
        let known = vec![];
        let characters = ex.extract_new("scene text", "S01E01", &known).await.unwrap();

        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].name, "Alice");
        assert_eq!(characters[0].role, CharacterRole::Protagonist);
        assert_eq!(characters[0].aliases, vec!["Al"]);
        assert_eq!(characters[0].first_appearance.as_deref(), Some("S01E01"));
        // Unknown role string falls back to minor.
        assert_eq!(characters[1].role, CharacterRole::Minor);
    }

    #[tokio::test]
    async fn test_known_characters_are_skipped() {
        // Only one details response scripted: Bob. Alice must be skipped
        // without a detail call.
        let ex = extractor(vec!["Alice\nBob", BOB_DETAILS]);
        let known = vec!["Alice".to_string()];
        let characters = ex.extract_new("scene text", "S01E02", &known).await.unwrap();

        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Bob");
    }

    #[tokio::test]
    async fn test_exact_match_is_case_sensitive() {
        let ex = extractor(vec!["alice", ALICE_DETAILS]);
        let known = vec!["Alice".to_string()];
        let characters = ex.extract_new("scene text", "S01E03", &known).await.unwrap();
        // "alice" is not "Alice": a new record is produced.
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "alice");
    }
}
