//! Character records.
//!
//! Characters accumulate across episodes: the name is the de-duplication
//! key (case-sensitive exact match -- no fuzzy identity resolution), and the
//! development timeline is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Character role in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    Protagonist,
    Antagonist,
    Supporting,
    Minor,
    Guest,
    Recurring,
}

impl Default for CharacterRole {
    fn default() -> Self {
        CharacterRole::Minor
    }
}

impl fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CharacterRole::Protagonist => "protagonist",
            CharacterRole::Antagonist => "antagonist",
            CharacterRole::Supporting => "supporting",
            CharacterRole::Minor => "minor",
            CharacterRole::Guest => "guest",
            CharacterRole::Recurring => "recurring",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CharacterRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "protagonist" => Ok(CharacterRole::Protagonist),
            "antagonist" => Ok(CharacterRole::Antagonist),
            "supporting" => Ok(CharacterRole::Supporting),
            "minor" => Ok(CharacterRole::Minor),
            "guest" => Ok(CharacterRole::Guest),
            "recurring" => Ok(CharacterRole::Recurring),
            other => Err(format!("invalid character role: '{other}'")),
        }
    }
}

/// A single entry in a character's development timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterChange {
    pub description: String,
    pub episode_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Character profile, cumulative across episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Full name. De-duplication key, exact match.
    pub name: String,
    /// Alternative names and nicknames. Never merge identities.
    pub aliases: Vec<String>,
    pub role: CharacterRole,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Age as a string -- the source material is often approximate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    pub personality_traits: Vec<String>,
    pub skills_abilities: Vec<String>,
    pub goals_motivations: Vec<String>,
    pub fears_weaknesses: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_arc: Option<String>,
    pub important_quotes: Vec<String>,
    /// Scene ids of important character moments.
    pub key_scenes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_appearance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_appearance: Option<String>,
    pub episode_appearances: Vec<String>,

    pub changes: Vec<CharacterChange>,

    pub importance_score: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            aliases: Vec::new(),
            role: CharacterRole::default(),
            description: None,
            occupation: None,
            age: None,
            background: None,
            personality_traits: Vec::new(),
            skills_abilities: Vec::new(),
            goals_motivations: Vec::new(),
            fears_weaknesses: Vec::new(),
            character_arc: None,
            important_quotes: Vec::new(),
            key_scenes: Vec::new(),
            first_appearance: None,
            last_appearance: None,
            episode_appearances: Vec::new(),
            changes: Vec::new(),
            importance_score: 0.5,
            created_at: now,
            updated_at: now,
        }
    }

    /// The stable archive id for a character name.
    pub fn record_id(name: &str) -> String {
        name.to_lowercase().replace(' ', "_")
    }

    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidCharacterName("name cannot be empty".into()));
        }
        if trimmed.len() > 100 {
            return Err(ValidationError::InvalidCharacterName(
                "name too long (maximum 100 characters)".into(),
            ));
        }
        Ok(())
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if alias != self.name && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    /// Record an episode appearance, updating first/last appearance markers.
    pub fn add_appearance(&mut self, episode_id: impl Into<String>) {
        let episode_id = episode_id.into();
        if !self.episode_appearances.contains(&episode_id) {
            self.episode_appearances.push(episode_id.clone());
        }
        if self.first_appearance.is_none() {
            self.first_appearance = Some(episode_id.clone());
        }
        self.last_appearance = Some(episode_id);
    }

    /// Append a development entry and touch `updated_at`.
    pub fn record_change(
        &mut self,
        description: impl Into<String>,
        episode_id: impl Into<String>,
        scene_id: Option<String>,
    ) {
        self.changes.push(CharacterChange {
            description: description.into(),
            episode_id: episode_id.into(),
            scene_id,
            recorded_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Merge newly extracted information into this cumulative profile.
    ///
    /// Lists extend without duplicates, empty optional fields fill in from
    /// the newer extraction, and the appearance markers advance. The name
    /// is never touched.
    pub fn absorb(&mut self, newer: Character) {
        for alias in newer.aliases {
            self.add_alias(alias);
        }
        if self.description.is_none() {
            self.description = newer.description;
        }
        if self.occupation.is_none() {
            self.occupation = newer.occupation;
        }
        if self.age.is_none() {
            self.age = newer.age;
        }
        if self.background.is_none() {
            self.background = newer.background;
        }
        if self.character_arc.is_none() {
            self.character_arc = newer.character_arc;
        }
        extend_unique(&mut self.personality_traits, newer.personality_traits);
        extend_unique(&mut self.skills_abilities, newer.skills_abilities);
        extend_unique(&mut self.goals_motivations, newer.goals_motivations);
        extend_unique(&mut self.fears_weaknesses, newer.fears_weaknesses);
        extend_unique(&mut self.important_quotes, newer.important_quotes);
        extend_unique(&mut self.key_scenes, newer.key_scenes);
        for episode_id in newer.episode_appearances {
            self.add_appearance(episode_id);
        }
        self.changes.extend(newer.changes);
        self.importance_score = self.importance_score.max(newer.importance_score);
        self.updated_at = Utc::now();
    }

    /// Development timeline ordered by episode id.
    pub fn journey(&self) -> Vec<&CharacterChange> {
        let mut entries: Vec<&CharacterChange> = self.changes.iter().collect();
        entries.sort_by(|a, b| a.episode_id.cmp(&b.episode_id));
        entries
    }
}

fn extend_unique(target: &mut Vec<String>, source: Vec<String>) {
    for item in source {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [
            CharacterRole::Protagonist,
            CharacterRole::Antagonist,
            CharacterRole::Supporting,
            CharacterRole::Minor,
            CharacterRole::Guest,
            CharacterRole::Recurring,
        ] {
            let parsed: CharacterRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_default_role_is_minor() {
        assert_eq!(CharacterRole::default(), CharacterRole::Minor);
    }

    #[test]
    fn test_record_id() {
        assert_eq!(Character::record_id("Walter White"), "walter_white");
        assert_eq!(Character::record_id("Alice"), "alice");
    }

    #[test]
    fn test_alias_excludes_own_name() {
        let mut c = Character::new("Alice");
        c.add_alias("Alice");
        c.add_alias("Al");
        c.add_alias("Al");
        assert_eq!(c.aliases, vec!["Al"]);
    }

    #[test]
    fn test_appearance_tracking() {
        let mut c = Character::new("Alice");
        c.add_appearance("S01E01");
        c.add_appearance("S01E03");
        c.add_appearance("S01E03");
        assert_eq!(c.first_appearance.as_deref(), Some("S01E01"));
        assert_eq!(c.last_appearance.as_deref(), Some("S01E03"));
        assert_eq!(c.episode_appearances.len(), 2);
    }

    #[test]
    fn test_journey_ordered_by_episode() {
        let mut c = Character::new("Alice");
        c.record_change("grows bolder", "S02E01", None);
        c.record_change("introduced", "S01E01", None);
        let journey = c.journey();
        assert_eq!(journey[0].episode_id, "S01E01");
        assert_eq!(journey[1].episode_id, "S02E01");
    }

    #[test]
    fn test_absorb_merges_without_duplicates() {
        let mut base = Character::new("Alice");
        base.personality_traits = vec!["stubborn".to_string()];
        base.occupation = Some("detective".to_string());
        base.add_appearance("S01E01");

        let mut newer = Character::new("Alice");
        newer.personality_traits = vec!["stubborn".to_string(), "loyal".to_string()];
        newer.occupation = Some("ex-detective".to_string());
        newer.importance_score = 0.9;
        newer.add_appearance("S01E02");

        base.absorb(newer);

        assert_eq!(base.personality_traits, vec!["stubborn", "loyal"]);
        // Existing fields are not overwritten.
        assert_eq!(base.occupation.as_deref(), Some("detective"));
        assert_eq!(base.importance_score, 0.9);
        assert_eq!(base.first_appearance.as_deref(), Some("S01E01"));
        assert_eq!(base.last_appearance.as_deref(), Some("S01E02"));
    }

    #[test]
    fn test_validate_name() {
        assert!(Character::validate_name("Alice").is_ok());
        assert!(Character::validate_name("  ").is_err());
        assert!(Character::validate_name(&"x".repeat(101)).is_err());
    }
}
