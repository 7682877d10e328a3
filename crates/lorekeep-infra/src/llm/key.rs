//! API key resolution from the process environment.
//!
//! Groq keys carry a `gsk_` prefix; format validation is opt-in via the
//! agent's `validate_api_key` flag. A missing key is not an error unless the
//! caller requires one -- queries over already-stored data work without it.

use secrecy::SecretString;

use lorekeep_types::error::ConfigError;

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

/// Expected key prefix for format validation.
pub const GROQ_KEY_PREFIX: &str = "gsk_";

/// Validate a raw key value. `None`/blank means "not configured".
pub fn validate_key_value(
    value: Option<String>,
    strict_format: bool,
) -> Result<Option<SecretString>, ConfigError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if strict_format && !value.starts_with(GROQ_KEY_PREFIX) {
        return Err(ConfigError::InvalidApiKeyFormat { expected_prefix: GROQ_KEY_PREFIX });
    }
    Ok(Some(SecretString::from(value)))
}

/// Read the API key from the environment.
pub fn load_api_key(strict_format: bool) -> Result<Option<SecretString>, ConfigError> {
    validate_key_value(std::env::var(GROQ_API_KEY_VAR).ok(), strict_format)
}

/// Read the API key from the environment, failing when absent.
pub fn require_api_key(strict_format: bool) -> Result<SecretString, ConfigError> {
    load_api_key(strict_format)?.ok_or(ConfigError::MissingApiKey(GROQ_API_KEY_VAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_none() {
        assert!(validate_key_value(None, true).unwrap().is_none());
        assert!(validate_key_value(Some("   ".to_string()), true).unwrap().is_none());
    }

    #[test]
    fn test_valid_key_accepted() {
        let key = validate_key_value(Some("gsk_abc123".to_string()), true).unwrap();
        assert!(key.is_some());
    }

    #[test]
    fn test_bad_prefix_rejected_when_strict() {
        let result = validate_key_value(Some("sk-wrong-prefix".to_string()), true);
        assert!(matches!(result, Err(ConfigError::InvalidApiKeyFormat { .. })));
    }

    #[test]
    fn test_bad_prefix_accepted_when_lenient() {
        let key = validate_key_value(Some("sk-wrong-prefix".to_string()), false).unwrap();
        assert!(key.is_some());
    }
}
