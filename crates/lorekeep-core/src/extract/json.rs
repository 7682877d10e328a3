//! Strict JSON boundary between LLM output and typed records.
//!
//! Responses pass through payload extraction (markdown fences, surrounding
//! prose) into serde deserialization. A parse failure triggers exactly one
//! retry with a stricter system prompt; a second failure surfaces
//! `ExtractError::Parse`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use lorekeep_types::error::ExtractError;
use lorekeep_types::llm::{CompletionRequest, LlmError};

use crate::llm::BoxLlmProvider;
use crate::retry::{retry_with_backoff, RetryPolicy};

use super::prompts::STRICT_JSON_REMINDER;

/// Accepts either a JSON array or a single object where an array is
/// expected; models occasionally return one event instead of `[event]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Locate the JSON payload inside a response: the first balanced `{...}`
/// or `[...]` span, skipping braces inside string literals. A bare `null`
/// is also accepted (some prompts allow it as "nothing found").
pub fn find_json_payload(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    if trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("none") {
        return Some("null");
    }

    let start = trimmed.find(['{', '['])?;
    let bytes = trimmed.as_bytes();
    let (open, close) = if bytes[start] == b'{' { (b'{', b'}') } else { (b'[', b']') };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&trimmed[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and deserialize the JSON payload from a raw response.
pub fn parse_json_response<T: DeserializeOwned>(
    response: &str,
    expected: &'static str,
) -> Result<T, ExtractError> {
    let payload = find_json_payload(response).ok_or(ExtractError::NoJson)?;
    serde_json::from_str(payload).map_err(|e| ExtractError::Parse {
        expected,
        detail: format!("{e}; payload preview: {}", preview(payload)),
    })
}

fn preview(payload: &str) -> &str {
    let end = payload
        .char_indices()
        .take(200)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &payload[..end]
}

/// Send a system/user prompt pair and deserialize the JSON response.
///
/// Transient provider errors retry with bounded backoff. A malformed
/// response is re-requested exactly once with [`STRICT_JSON_REMINDER`]
/// appended to the system prompt; if the retry is also malformed the parse
/// error surfaces to the caller.
pub async fn complete_json<T: DeserializeOwned>(
    provider: &BoxLlmProvider,
    system: &str,
    user: &str,
    temperature: f64,
    expected: &'static str,
) -> Result<T, ExtractError> {
    let request = CompletionRequest::from_prompts(system, user, temperature);
    let response = retry_with_backoff(RetryPolicy::default(), |e: &LlmError| e.is_retryable(), || {
        provider.complete(&request)
    })
    .await?;

    match parse_json_response(&response.content, expected) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            tracing::warn!(
                error = %first_err,
                expected,
                "malformed LLM response, retrying once with stricter prompt"
            );
            let strict_system = format!("{system}{STRICT_JSON_REMINDER}");
            let strict_request = CompletionRequest::from_prompts(strict_system, user, temperature);
            let retry_response =
                retry_with_backoff(RetryPolicy::default(), |e: &LlmError| e.is_retryable(), || {
                    provider.complete(&strict_request)
                })
                .await?;
            parse_json_response(&retry_response.content, expected)
        }
    }
}

/// Send a prompt pair and return the raw text content (non-JSON calls:
/// scene splitting, character name lists, summary prose).
pub async fn complete_text(
    provider: &BoxLlmProvider,
    system: &str,
    user: &str,
    temperature: f64,
) -> Result<String, ExtractError> {
    let request = CompletionRequest::from_prompts(system, user, temperature);
    let response = retry_with_backoff(RetryPolicy::default(), |e: &LlmError| e.is_retryable(), || {
        provider.complete(&request)
    })
    .await?;
    Ok(response.content)
}

/// Clamp an LLM-supplied score into 0.0..=1.0.
pub fn clamp_unit(value: f64) -> f32 {
    value.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        name: String,
        score: f64,
    }

    #[test]
    fn test_find_payload_plain_object() {
        let response = r#"{"name": "Alice", "score": 0.8}"#;
        assert_eq!(find_json_payload(response), Some(response));
    }

    #[test]
    fn test_find_payload_inside_markdown_fence() {
        let response = "Here you go:\n```json\n{\"name\": \"Alice\", \"score\": 0.8}\n```\nHope that helps!";
        assert_eq!(find_json_payload(response), Some(r#"{"name": "Alice", "score": 0.8}"#));
    }

    #[test]
    fn test_find_payload_ignores_braces_in_strings() {
        let response = r#"{"name": "A{lice}", "score": 1.0}"#;
        assert_eq!(find_json_payload(response), Some(response));
    }

    #[test]
    fn test_find_payload_array() {
        let response = "result: [1, 2, 3] done";
        assert_eq!(find_json_payload(response), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_find_payload_bare_null() {
        assert_eq!(find_json_payload("  null "), Some("null"));
        assert_eq!(find_json_payload("None"), Some("null"));
    }

    #[test]
    fn test_find_payload_missing() {
        assert_eq!(find_json_payload("no structured data here"), None);
    }

    #[test]
    fn test_parse_json_response_reports_expected_type() {
        let err = parse_json_response::<Payload>(r#"{"name": 42}"#, "Payload").unwrap_err();
        match err {
            ExtractError::Parse { expected, .. } => assert_eq!(expected, "Payload"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_one_or_many() {
        let many: OneOrMany<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(many.into_vec(), vec![1, 2]);

        let one: OneOrMany<u32> = serde_json::from_str("7").unwrap();
        assert_eq!(one.into_vec(), vec![7]);
    }

    #[tokio::test]
    async fn test_complete_json_happy_path() {
        let provider = BoxLlmProvider::new(MockProvider::new(vec![
            r#"{"name": "Alice", "score": 0.8}"#,
        ]));
        let parsed: Payload = complete_json(&provider, "system", "user", 0.1, "Payload")
            .await
            .unwrap();
        assert_eq!(parsed, Payload { name: "Alice".into(), score: 0.8 });
    }

    #[tokio::test]
    async fn test_malformed_response_retries_once_with_stricter_prompt() {
        let mock = MockProvider::new(vec![
            "I think the answer is probably Alice?",
            r#"{"name": "Alice", "score": 0.8}"#,
        ]);
        let provider = BoxLlmProvider::new(mock);
        let parsed: Payload = complete_json(&provider, "system", "user", 0.1, "Payload")
            .await
            .unwrap();
        assert_eq!(parsed.name, "Alice");
    }

    #[tokio::test]
    async fn test_second_malformed_response_surfaces_parse_error() {
        // Exactly one retry: two bad responses, two calls, then the error.
        let mock = MockProvider::new(vec!["not json", "still not json"]);
        let provider = BoxLlmProvider::new(mock);
        let result: Result<Payload, _> =
            complete_json(&provider, "system prompt", "user", 0.1, "Payload").await;
        assert!(matches!(result, Err(ExtractError::NoJson | ExtractError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_retry_request_carries_strict_reminder() {
        let mock = std::sync::Arc::new(MockProvider::new(vec![
            "garbage",
            r#"{"name": "A", "score": 0.1}"#,
        ]));
        let provider = BoxLlmProvider::new(mock.clone());
        let _: Payload = complete_json(&provider, "base system", "user", 0.1, "Payload")
            .await
            .unwrap();

        assert_eq!(mock.calls(), 2);
        let first = mock.request_at(0);
        let second = mock.request_at(1);
        assert!(!first.messages[0].content.contains("could not be parsed"));
        assert!(second.messages[0].content.starts_with("base system"));
        assert!(second.messages[0].content.contains("could not be parsed"));
    }

    #[tokio::test]
    async fn test_parse_failure_makes_exactly_two_calls() {
        let mock = std::sync::Arc::new(MockProvider::new(vec!["not json", "still not json"]));
        let provider = BoxLlmProvider::new(mock.clone());
        let result: Result<Payload, _> =
            complete_json(&provider, "system", "user", 0.1, "Payload").await;
        assert!(result.is_err());
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(0.5), 0.5);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
    }
}
