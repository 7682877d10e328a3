//! Wire types for the Groq (OpenAI-compatible) chat completions API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GroqChatRequest {
    pub model: String,
    pub messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct GroqChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<GroqChoice>,
    #[serde(default)]
    pub usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
pub struct GroqChoice {
    pub message: GroqMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroqUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_absent_options() {
        let request = GroqChatRequest {
            model: "llama-3.1-8b-instant".to_string(),
            messages: vec![GroqMessage { role: "user".to_string(), content: "hi".to_string() }],
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
        assert!(json.contains("\"model\":\"llama-3.1-8b-instant\""));
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "llama-3.1-8b-instant",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello!"},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let response: GroqChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content, "Hello!");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_response_without_usage() {
        let json = r#"{
            "id": "chatcmpl-456",
            "model": "llama-3.1-8b-instant",
            "choices": [{"message": {"role": "assistant", "content": "ok"}}]
        }"#;
        let response: GroqChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.usage.is_none());
        assert!(response.choices[0].finish_reason.is_none());
    }
}
