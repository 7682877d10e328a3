//! Agent configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ValidationError;

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default generation temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Configuration for a [`SeriesAgent`](https://docs.rs/lorekeep-core).
///
/// Owned by the agent instance -- there is no global state. The storage
/// directory holds the vector database's on-disk collections; deleting it
/// resets all stored knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name of the series; used to namespace collections.
    pub series_name: String,
    /// Directory holding the vector database.
    pub data_dir: PathBuf,
    /// LLM model identifier.
    pub model: String,
    /// Generation temperature, 0.0..=1.0.
    pub temperature: f64,
    /// Whether to fail construction when the API key is missing or malformed.
    pub validate_api_key: bool,
}

impl AgentConfig {
    pub fn new(series_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            series_name: series_name.into(),
            data_dir: data_dir.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            validate_api_key: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn without_key_validation(mut self) -> Self {
        self.validate_api_key = false;
        self
    }

    /// Collection namespace derived from the series name, e.g.
    /// `"Breaking Point"` -> `"breaking_point"`.
    pub fn series_slug(&self) -> String {
        self.series_name.trim().to_lowercase().replace(' ', "_")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.series_name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidSeriesName("name cannot be empty".into()));
        }
        if name.len() > 200 {
            return Err(ValidationError::InvalidSeriesName(
                "name too long (maximum 200 characters)".into(),
            ));
        }
        if !name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || c.is_ascii_whitespace()
                || matches!(c, '-' | '_' | '.' | '(' | ')' | '\'' | '"')
        }) {
            return Err(ValidationError::InvalidSeriesName(
                "name contains invalid characters".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::new("Breaking Point", "/tmp/lorekeep");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert!(config.validate_api_key);
    }

    #[test]
    fn test_series_slug() {
        let config = AgentConfig::new("Breaking Point", "/tmp/db");
        assert_eq!(config.series_slug(), "breaking_point");
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let config = AgentConfig::new("   ", "/tmp/db");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSeriesName(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_characters() {
        let config = AgentConfig::new("show/with/slashes", "/tmp/db");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_temperature_range() {
        let config = AgentConfig::new("Show", "/tmp/db").with_temperature(1.5);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTemperature(_))
        ));

        let config = AgentConfig::new("Show", "/tmp/db").with_temperature(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = AgentConfig::new("Show", "/tmp/db")
            .with_model("llama-3.3-70b-versatile")
            .with_temperature(0.3)
            .without_key_validation();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert!(!config.validate_api_key);
    }
}
