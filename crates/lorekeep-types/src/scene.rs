//! Scene records.
//!
//! Scenes are produced by segmentation and are immutable once stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Emotional tone of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Happy,
    Sad,
    Tense,
    Romantic,
    Comedic,
    Dramatic,
    Mysterious,
    Action,
    Peaceful,
    Angry,
    Fearful,
    Nostalgic,
}

impl fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmotionalTone::Happy => "happy",
            EmotionalTone::Sad => "sad",
            EmotionalTone::Tense => "tense",
            EmotionalTone::Romantic => "romantic",
            EmotionalTone::Comedic => "comedic",
            EmotionalTone::Dramatic => "dramatic",
            EmotionalTone::Mysterious => "mysterious",
            EmotionalTone::Action => "action",
            EmotionalTone::Peaceful => "peaceful",
            EmotionalTone::Angry => "angry",
            EmotionalTone::Fearful => "fearful",
            EmotionalTone::Nostalgic => "nostalgic",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EmotionalTone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(EmotionalTone::Happy),
            "sad" => Ok(EmotionalTone::Sad),
            "tense" => Ok(EmotionalTone::Tense),
            "romantic" => Ok(EmotionalTone::Romantic),
            "comedic" => Ok(EmotionalTone::Comedic),
            "dramatic" => Ok(EmotionalTone::Dramatic),
            "mysterious" => Ok(EmotionalTone::Mysterious),
            "action" => Ok(EmotionalTone::Action),
            "peaceful" => Ok(EmotionalTone::Peaceful),
            "angry" => Ok(EmotionalTone::Angry),
            "fearful" => Ok(EmotionalTone::Fearful),
            "nostalgic" => Ok(EmotionalTone::Nostalgic),
            other => Err(format!("invalid emotional tone: '{other}'")),
        }
    }
}

/// An individual scene within an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene id, e.g. `S01E01_S001`.
    pub id: String,
    pub episode_id: String,
    /// 1-based scene number within the episode.
    pub scene_number: u32,

    /// Scene transcript span.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    pub characters_present: Vec<String>,

    pub key_dialogue: Vec<String>,
    /// Plot event ids that occur in this scene.
    pub plot_events: Vec<String>,
    pub character_developments: Vec<String>,
    pub relationship_dynamics: Vec<String>,

    pub emotional_tone: Vec<EmotionalTone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_description: Option<String>,

    /// Relevance to the main plot, 0.0..=1.0.
    pub plot_relevance: f32,
    pub foreshadowing: Vec<String>,
    pub callbacks: Vec<String>,

    /// Overall scene importance, 0.0..=1.0.
    pub importance_score: f32,
    pub themes: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl Scene {
    /// Create a bare scene with defaults; the segmenter fills in analysis.
    pub fn new(episode_id: impl Into<String>, scene_number: u32, content: impl Into<String>) -> Self {
        let episode_id = episode_id.into();
        Self {
            id: Self::scene_id(&episode_id, scene_number),
            episode_id,
            scene_number,
            content: content.into(),
            summary: None,
            location: None,
            time_of_day: None,
            characters_present: Vec::new(),
            key_dialogue: Vec::new(),
            plot_events: Vec::new(),
            character_developments: Vec::new(),
            relationship_dynamics: Vec::new(),
            emotional_tone: Vec::new(),
            mood_description: None,
            plot_relevance: 0.5,
            foreshadowing: Vec::new(),
            callbacks: Vec::new(),
            importance_score: 0.5,
            themes: Vec::new(),
            processed_at: Utc::now(),
        }
    }

    /// Canonical scene id, e.g. `S01E01_S002`.
    pub fn scene_id(episode_id: &str, scene_number: u32) -> String {
        format!("{episode_id}_S{scene_number:03}")
    }

    pub fn add_character(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.characters_present.contains(&name) {
            self.characters_present.push(name);
        }
    }

    pub fn add_plot_event(&mut self, event_id: impl Into<String>) {
        let event_id = event_id.into();
        if !self.plot_events.contains(&event_id) {
            self.plot_events.push(event_id);
        }
    }
}
