//! Episode records.
//!
//! An episode is the ingestion unit: caller-supplied metadata plus the raw
//! transcript, enriched during processing with scene ids, introduced
//! characters, plot arcs, a digest summary, and an importance score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Caller-supplied episode metadata, validated before processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub season: u32,
    pub episode: u32,
    pub title: String,
    /// Original air date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Episode duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl EpisodeInfo {
    pub fn new(season: u32, episode: u32, title: impl Into<String>) -> Self {
        Self {
            season,
            episode,
            title: title.into(),
            air_date: None,
            duration: None,
            synopsis: None,
        }
    }

    /// The canonical episode id, e.g. `S01E03`.
    pub fn episode_id(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.season < 1 {
            return Err(ValidationError::InvalidSeason);
        }
        if self.episode < 1 {
            return Err(ValidationError::InvalidEpisode);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if let Some(date) = &self.air_date {
            if !is_iso_date(date) {
                return Err(ValidationError::InvalidAirDate(date.clone()));
            }
        }
        Ok(())
    }
}

fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && s.char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() })
}

/// Complete episode record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Canonical id, e.g. `S01E03`.
    pub id: String,
    pub info: EpisodeInfo,
    pub transcript: String,
    /// Scene ids in order of appearance.
    pub scenes: Vec<String>,
    /// Characters first seen in this episode.
    pub characters_introduced: Vec<String>,
    /// Plot arcs active in this episode.
    pub plot_arcs: Vec<String>,
    pub themes: Vec<String>,
    /// Generated summary, populated after processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Overall episode importance, 0.0..=1.0.
    pub importance_score: f32,
    pub processed_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(info: EpisodeInfo, transcript: impl Into<String>) -> Self {
        Self {
            id: info.episode_id(),
            info,
            transcript: transcript.into(),
            scenes: Vec::new(),
            characters_introduced: Vec::new(),
            plot_arcs: Vec::new(),
            themes: Vec::new(),
            summary: None,
            importance_score: 0.5,
            processed_at: Utc::now(),
        }
    }

    pub fn add_scene(&mut self, scene_id: impl Into<String>) {
        let scene_id = scene_id.into();
        if !self.scenes.contains(&scene_id) {
            self.scenes.push(scene_id);
        }
    }

    pub fn add_character(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.characters_introduced.contains(&name) {
            self.characters_introduced.push(name);
        }
    }

    pub fn add_plot_arc(&mut self, arc: impl Into<String>) {
        let arc = arc.into();
        if !self.plot_arcs.contains(&arc) {
            self.plot_arcs.push(arc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_id_format() {
        let info = EpisodeInfo::new(1, 3, "Pilot");
        assert_eq!(info.episode_id(), "S01E03");

        let info = EpisodeInfo::new(12, 24, "Finale");
        assert_eq!(info.episode_id(), "S12E24");
    }

    #[test]
    fn test_validate_rejects_zero_season() {
        let info = EpisodeInfo::new(0, 1, "Pilot");
        assert!(matches!(info.validate(), Err(ValidationError::InvalidSeason)));
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let info = EpisodeInfo::new(1, 1, "   ");
        assert!(matches!(info.validate(), Err(ValidationError::MissingField("title"))));
    }

    #[test]
    fn test_validate_air_date_format() {
        let mut info = EpisodeInfo::new(1, 1, "Pilot");
        info.air_date = Some("2008-01-20".to_string());
        assert!(info.validate().is_ok());

        info.air_date = Some("Jan 20, 2008".to_string());
        assert!(matches!(info.validate(), Err(ValidationError::InvalidAirDate(_))));

        info.air_date = Some("2008-1-20".to_string());
        assert!(info.validate().is_err());
    }

    #[test]
    fn test_add_scene_deduplicates() {
        let mut episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "transcript");
        episode.add_scene("S01E01_S001");
        episode.add_scene("S01E01_S001");
        episode.add_scene("S01E01_S002");
        assert_eq!(episode.scenes, vec!["S01E01_S001", "S01E01_S002"]);
    }

    #[test]
    fn test_add_character_deduplicates() {
        let mut episode = Episode::new(EpisodeInfo::new(1, 1, "Pilot"), "transcript");
        episode.add_character("Alice");
        episode.add_character("Alice");
        assert_eq!(episode.characters_introduced.len(), 1);
    }
}
