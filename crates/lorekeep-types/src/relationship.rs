//! Relationship records.
//!
//! A relationship links two characters. The pair is unordered: A-B and B-A
//! resolve to the same record id, and the change timeline is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Types of relationships between characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Family,
    Romantic,
    Friendship,
    Rivalry,
    Professional,
    MentorStudent,
    Enemy,
    Acquaintance,
    Alliance,
    Complicated,
}

impl Default for RelationshipType {
    fn default() -> Self {
        RelationshipType::Acquaintance
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipType::Family => "family",
            RelationshipType::Romantic => "romantic",
            RelationshipType::Friendship => "friendship",
            RelationshipType::Rivalry => "rivalry",
            RelationshipType::Professional => "professional",
            RelationshipType::MentorStudent => "mentor_student",
            RelationshipType::Enemy => "enemy",
            RelationshipType::Acquaintance => "acquaintance",
            RelationshipType::Alliance => "alliance",
            RelationshipType::Complicated => "complicated",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "family" => Ok(RelationshipType::Family),
            "romantic" => Ok(RelationshipType::Romantic),
            "friendship" => Ok(RelationshipType::Friendship),
            "rivalry" => Ok(RelationshipType::Rivalry),
            "professional" => Ok(RelationshipType::Professional),
            "mentor_student" => Ok(RelationshipType::MentorStudent),
            "enemy" => Ok(RelationshipType::Enemy),
            "acquaintance" => Ok(RelationshipType::Acquaintance),
            "alliance" => Ok(RelationshipType::Alliance),
            "complicated" => Ok(RelationshipType::Complicated),
            other => Err(format!("invalid relationship type: '{other}'")),
        }
    }
}

/// Current status of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Developing,
    Established,
    Strained,
    Broken,
    Reconciled,
    Ended,
    Unknown,
}

impl Default for RelationshipStatus {
    fn default() -> Self {
        RelationshipStatus::Unknown
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipStatus::Developing => "developing",
            RelationshipStatus::Established => "established",
            RelationshipStatus::Strained => "strained",
            RelationshipStatus::Broken => "broken",
            RelationshipStatus::Reconciled => "reconciled",
            RelationshipStatus::Ended => "ended",
            RelationshipStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "developing" => Ok(RelationshipStatus::Developing),
            "established" => Ok(RelationshipStatus::Established),
            "strained" => Ok(RelationshipStatus::Strained),
            "broken" => Ok(RelationshipStatus::Broken),
            "reconciled" => Ok(RelationshipStatus::Reconciled),
            "ended" => Ok(RelationshipStatus::Ended),
            "unknown" => Ok(RelationshipStatus::Unknown),
            other => Err(format!("invalid relationship status: '{other}'")),
        }
    }
}

/// A change in a relationship over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipChange {
    pub episode_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<RelationshipStatus>,
    pub new_status: RelationshipStatus,
    pub description: String,
    /// Key dialogue or action that caused the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_moment: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Relationship between two characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Order-independent pair id, e.g. `alice_bob`.
    pub id: String,
    pub character1: String,
    pub character2: String,
    pub relationship_type: RelationshipType,
    pub current_status: RelationshipStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_they_met: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<String>,

    /// Episode id of the first observed interaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_interaction: Option<String>,
    pub key_scenes: Vec<String>,
    pub important_dialogue: Vec<String>,

    pub changes: Vec<RelationshipChange>,
    pub conflict_patterns: Vec<String>,
    pub resolution_patterns: Vec<String>,

    pub importance_score: f32,
    pub emotional_intensity: f32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Order-independent pair key: names are sorted before joining, so
    /// `pair_id("Bob", "Alice") == pair_id("Alice", "Bob")`.
    pub fn pair_id(a: &str, b: &str) -> String {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        format!("{first}_{second}").replace(' ', "_").to_lowercase()
    }

    pub fn new(character1: impl Into<String>, character2: impl Into<String>) -> Self {
        let character1 = character1.into();
        let character2 = character2.into();
        let now = Utc::now();
        Self {
            id: Self::pair_id(&character1, &character2),
            character1,
            character2,
            relationship_type: RelationshipType::default(),
            current_status: RelationshipStatus::default(),
            description: None,
            how_they_met: None,
            dynamic: None,
            first_interaction: None,
            key_scenes: Vec::new(),
            important_dialogue: Vec::new(),
            changes: Vec::new(),
            conflict_patterns: Vec::new(),
            resolution_patterns: Vec::new(),
            importance_score: 0.5,
            emotional_intensity: 0.5,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.character1 == name || self.character2 == name
    }

    pub fn other_character(&self, name: &str) -> Option<&str> {
        if self.character1 == name {
            Some(&self.character2)
        } else if self.character2 == name {
            Some(&self.character1)
        } else {
            None
        }
    }

    pub fn add_dialogue(&mut self, dialogue: impl Into<String>) {
        let dialogue = dialogue.into();
        if !self.important_dialogue.contains(&dialogue) {
            self.important_dialogue.push(dialogue);
        }
    }

    /// Append a status change, keeping `current_status` in sync.
    pub fn record_change(
        &mut self,
        episode_id: impl Into<String>,
        new_status: RelationshipStatus,
        description: impl Into<String>,
        scene_id: Option<String>,
        key_moment: Option<String>,
    ) {
        self.changes.push(RelationshipChange {
            episode_id: episode_id.into(),
            scene_id,
            old_status: Some(self.current_status),
            new_status,
            description: description.into(),
            key_moment,
            recorded_at: Utc::now(),
        });
        self.current_status = new_status;
        self.updated_at = Utc::now();
    }

    /// Merge a newer observation of the same pair into this record.
    ///
    /// Dialogue and scenes append without duplicates; a differing status in
    /// the newer observation is recorded as a timeline change rather than a
    /// silent overwrite.
    pub fn absorb(&mut self, newer: Relationship, episode_id: &str) {
        if self.description.is_none() {
            self.description = newer.description;
        }
        if self.how_they_met.is_none() {
            self.how_they_met = newer.how_they_met;
        }
        if self.dynamic.is_none() {
            self.dynamic = newer.dynamic;
        }
        for dialogue in newer.important_dialogue {
            self.add_dialogue(dialogue);
        }
        for scene_id in newer.key_scenes {
            if !self.key_scenes.contains(&scene_id) {
                self.key_scenes.push(scene_id);
            }
        }
        if newer.current_status != RelationshipStatus::Unknown
            && newer.current_status != self.current_status
        {
            self.record_change(
                episode_id,
                newer.current_status,
                format!("status observed as {}", newer.current_status),
                None,
                None,
            );
        }
        self.importance_score = self.importance_score.max(newer.importance_score);
        self.emotional_intensity = self.emotional_intensity.max(newer.emotional_intensity);
        self.updated_at = Utc::now();
    }

    /// Change timeline ordered by episode id.
    pub fn timeline(&self) -> Vec<&RelationshipChange> {
        let mut entries: Vec<&RelationshipChange> = self.changes.iter().collect();
        entries.sort_by(|a, b| a.episode_id.cmp(&b.episode_id));
        entries
    }
}
