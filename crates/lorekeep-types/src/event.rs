//! Plot event records.
//!
//! Plot events are flagged by the extractor and never deleted. Mystery
//! clues and resolutions carry extra tracking fields used by the mystery
//! query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Types of plot events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MainPlot,
    Subplot,
    CharacterDevelopment,
    WorldBuilding,
    MysteryClue,
    MysteryResolution,
    ConflictIntroduction,
    ConflictEscalation,
    ConflictResolution,
    Revelation,
    Twist,
    Cliffhanger,
    Flashback,
    Foreshadowing,
    Callback,
}

impl Default for EventType {
    fn default() -> Self {
        EventType::MainPlot
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::MainPlot => "main_plot",
            EventType::Subplot => "subplot",
            EventType::CharacterDevelopment => "character_development",
            EventType::WorldBuilding => "world_building",
            EventType::MysteryClue => "mystery_clue",
            EventType::MysteryResolution => "mystery_resolution",
            EventType::ConflictIntroduction => "conflict_introduction",
            EventType::ConflictEscalation => "conflict_escalation",
            EventType::ConflictResolution => "conflict_resolution",
            EventType::Revelation => "revelation",
            EventType::Twist => "twist",
            EventType::Cliffhanger => "cliffhanger",
            EventType::Flashback => "flashback",
            EventType::Foreshadowing => "foreshadowing",
            EventType::Callback => "callback",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main_plot" => Ok(EventType::MainPlot),
            "subplot" => Ok(EventType::Subplot),
            "character_development" => Ok(EventType::CharacterDevelopment),
            "world_building" => Ok(EventType::WorldBuilding),
            "mystery_clue" => Ok(EventType::MysteryClue),
            "mystery_resolution" => Ok(EventType::MysteryResolution),
            "conflict_introduction" => Ok(EventType::ConflictIntroduction),
            "conflict_escalation" => Ok(EventType::ConflictEscalation),
            "conflict_resolution" => Ok(EventType::ConflictResolution),
            "revelation" => Ok(EventType::Revelation),
            "twist" => Ok(EventType::Twist),
            "cliffhanger" => Ok(EventType::Cliffhanger),
            "flashback" => Ok(EventType::Flashback),
            "foreshadowing" => Ok(EventType::Foreshadowing),
            "callback" => Ok(EventType::Callback),
            other => Err(format!("invalid event type: '{other}'")),
        }
    }
}

/// Importance level of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventImportance {
    /// Major plot points, series-changing events.
    Critical,
    High,
    Medium,
    Low,
}

impl Default for EventImportance {
    fn default() -> Self {
        EventImportance::Medium
    }
}

impl fmt::Display for EventImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventImportance::Critical => "critical",
            EventImportance::High => "high",
            EventImportance::Medium => "medium",
            EventImportance::Low => "low",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventImportance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(EventImportance::Critical),
            "high" => Ok(EventImportance::High),
            "medium" => Ok(EventImportance::Medium),
            "low" => Ok(EventImportance::Low),
            other => Err(format!("invalid event importance: '{other}'")),
        }
    }
}

/// A plot event flagged by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotEvent {
    /// Unique id, e.g. `S01E01_S002_E001`.
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub importance: EventImportance,

    pub episode_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,

    pub characters_involved: Vec<String>,
    /// Arc/mystery tag, used for filtered retrieval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_arc: Option<String>,
    pub themes: Vec<String>,

    pub emotional_impact: f32,
    pub plot_significance: f32,

    pub mystery_elements: Vec<String>,
    pub reveals_information: Vec<String>,
    pub questions_raised: Vec<String>,
    pub questions_answered: Vec<String>,
    pub foreshadowing_clues: Vec<String>,

    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PlotEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        episode_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            event_type: EventType::default(),
            importance: EventImportance::default(),
            episode_id: episode_id.into(),
            scene_id: None,
            characters_involved: Vec::new(),
            plot_arc: None,
            themes: Vec::new(),
            emotional_impact: 0.5,
            plot_significance: 0.5,
            mystery_elements: Vec::new(),
            reveals_information: Vec::new(),
            questions_raised: Vec::new(),
            questions_answered: Vec::new(),
            foreshadowing_clues: Vec::new(),
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Event id within a scene, e.g. `S01E01_S002_E003`.
    pub fn event_id(scene_id: &str, index: usize) -> String {
        format!("{scene_id}_E{:03}", index + 1)
    }

    pub fn is_mystery_related(&self) -> bool {
        matches!(self.event_type, EventType::MysteryClue | EventType::MysteryResolution)
            || !self.mystery_elements.is_empty()
    }

    pub fn is_major(&self) -> bool {
        matches!(self.importance, EventImportance::Critical | EventImportance::High)
            || self.plot_significance >= 0.7
    }
}
