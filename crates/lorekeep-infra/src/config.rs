//! Settings loader.
//!
//! Reads `config.toml` from the data directory and falls back to defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use lorekeep_types::config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// CLI/agent settings from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Bridge tracing spans to the OpenTelemetry stdout exporter.
    #[serde(default)]
    pub otel: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl Default for Settings {
    fn default() -> Self {
        Self { model: default_model(), temperature: default_temperature(), otel: false }
    }
}

/// Default data directory: `~/.lorekeep`.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".lorekeep")
}

/// Load settings from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparseable file: warn and use defaults.
pub async fn load_settings(data_dir: &Path) -> Settings {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config.toml at {}, using defaults", config_path.display());
            return Settings::default();
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using defaults", config_path.display());
            return Settings::default();
        }
    };

    match toml::from_str::<Settings>(&content) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("failed to parse {}: {err}, using defaults", config_path.display());
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings(tmp.path()).await;
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
        assert!(!settings.otel);
    }

    #[tokio::test]
    async fn test_valid_toml_parses() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "model = \"llama-3.3-70b-versatile\"\ntemperature = 0.3\notel = true\n",
        )
        .await
        .unwrap();

        let settings = load_settings(tmp.path()).await;
        assert_eq!(settings.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.temperature, 0.3);
        assert!(settings.otel);
    }

    #[tokio::test]
    async fn test_partial_toml_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "temperature = 0.7\n")
            .await
            .unwrap();

        let settings = load_settings(tmp.path()).await;
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.temperature, 0.7);
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let settings = load_settings(tmp.path()).await;
        assert_eq!(settings.model, DEFAULT_MODEL);
    }
}
