use thiserror::Error;

use crate::llm::LlmError;

/// Errors from validating caller-supplied input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid series name: {0}")]
    InvalidSeriesName(String),

    #[error("season must be a positive integer")]
    InvalidSeason,

    #[error("episode must be a positive integer")]
    InvalidEpisode,

    #[error("air date must be in YYYY-MM-DD format, got '{0}'")]
    InvalidAirDate(String),

    #[error("transcript too short (minimum {min} characters, got {got})")]
    TranscriptTooShort { min: usize, got: usize },

    #[error("transcript too long (maximum {max} characters, got {got})")]
    TranscriptTooLong { max: usize, got: usize },

    #[error("transcript cannot be empty")]
    EmptyTranscript,

    #[error("search query invalid: {0}")]
    InvalidQuery(String),

    #[error("temperature must be within 0.0..=1.0, got {0}")]
    InvalidTemperature(f64),

    #[error("character name invalid: {0}")]
    InvalidCharacterName(String),
}

/// Errors from the extraction boundary where loosely-typed LLM output is
/// converted into typed records.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The response did not match the expected schema, even after the single
    /// stricter-prompt retry.
    #[error("failed to parse LLM response as {expected}: {detail}")]
    Parse { expected: &'static str, detail: String },

    /// No JSON payload could be located in the response text.
    #[error("no JSON found in LLM response")]
    NoJson,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Errors from the vector archive.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying store could not be reached. Retryable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage query failed: {0}")]
    Query(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

impl StorageError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Errors raised at agent construction time. Fatal, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("API key has invalid format (expected '{expected_prefix}' prefix)")]
    InvalidApiKeyFormat { expected_prefix: &'static str },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Aggregate error for the public agent surface.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TranscriptTooShort { min: 100, got: 12 };
        assert_eq!(
            err.to_string(),
            "transcript too short (minimum 100 characters, got 12)"
        );
    }

    #[test]
    fn test_storage_unavailable_is_transient() {
        assert!(StorageError::Unavailable("connection refused".into()).is_transient());
        assert!(!StorageError::Query("bad filter".into()).is_transient());
        assert!(!StorageError::NotFound("S01E01".into()).is_transient());
    }

    #[test]
    fn test_agent_error_from_validation() {
        let err: AgentError = ValidationError::EmptyTranscript.into();
        assert!(matches!(err, AgentError::Validation(_)));
        assert_eq!(err.to_string(), "transcript cannot be empty");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidApiKeyFormat { expected_prefix: "gsk_" };
        assert!(err.to_string().contains("gsk_"));
    }
}
