//! Google Generative AI (`generateContent`) adapter.
//!
//! The whole conversation is flattened into one transcript prompt ending
//! with an `Assistant:` cue, so the provider sees a single user turn.

use super::{provider_error, split_system, TutorBackend};
use crate::config::{GenerationConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::prompts;
use crate::types::{BackendReply, ConversationMessage, Mode, Role, Usage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

const NAME: &str = "gemini";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Provider error text that marks a model unavailable for the API version.
const VERSION_MISMATCH: &str = "not found for API version";

pub const DEGRADED_SOCRATIC_REPLY: &str =
    "I'm curious about your question. Can you tell me what you already know about this topic?";
pub const DEGRADED_DIRECT_REPLY: &str =
    "I'm here to help! Let me provide a straightforward answer to your question.";

/// Adapter for `/v1beta/models/{model}:generateContent`.
pub struct GeminiBackend {
    model: String,
    endpoint: String,
    generation: GenerationConfig,
    degraded_reply_on_version_mismatch: bool,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: &ProviderConfig, generation: GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("gemini.api_key (or GOOGLE_API_KEY) is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| Error::Config(format!("invalid gemini api_key: {}", e)))?,
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model_or(DEFAULT_MODEL).to_string(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            generation,
            degraded_reply_on_version_mismatch: config.degraded_reply_on_version_mismatch,
            http,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_ONLY_HIGH" },
                { "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_ONLY_HIGH" },
            ],
            "generationConfig": {
                "maxOutputTokens": self.generation.max_output_tokens,
                "temperature": self.generation.temperature,
            },
        })
    }

    async fn generate(&self, prompt: &str) -> Result<BackendReply> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        );

        let resp = self
            .http
            .post(url)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| Error::backend(NAME, format!("request failed: {}", e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::backend(NAME, format!("read body failed: {}", e)))?;
        if !status.is_success() {
            return Err(provider_error(NAME, status.as_u16(), &text));
        }

        parse_response(&text)
    }
}

#[async_trait]
impl TutorBackend for GeminiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration_level: f32,
    ) -> Result<BackendReply> {
        let prompt = build_prompt(conversation, mode, frustration_level)?;

        match self.generate(&prompt).await {
            Err(Error::Backend { message, .. })
                if self.degraded_reply_on_version_mismatch && message.contains(VERSION_MISMATCH) =>
            {
                tracing::warn!(
                    model = %self.model,
                    error = %message,
                    "Model unavailable for API version, using degraded reply"
                );
                Ok(BackendReply::text(degraded_reply(mode)))
            }
            other => other,
        }
    }
}

fn degraded_reply(mode: Mode) -> &'static str {
    match mode {
        Mode::Socratic => DEGRADED_SOCRATIC_REPLY,
        Mode::Direct => DEGRADED_DIRECT_REPLY,
    }
}

/// Flatten the conversation into a single transcript prompt.
fn build_prompt(
    conversation: &[ConversationMessage],
    mode: Mode,
    frustration_level: f32,
) -> Result<String> {
    let (caller_system, rest) = split_system(conversation);
    let (last, history) = rest
        .split_last()
        .ok_or_else(|| Error::Validation("conversation has no user message".to_string()))?;

    let system = match caller_system {
        Some(msg) => msg.content.clone(),
        None => prompts::system_instruction(mode, frustration_level),
    };

    let mut transcript = String::new();
    for msg in history.iter().filter(|m| m.role != Role::System) {
        let speaker = match msg.role {
            Role::Assistant => "Assistant",
            _ => "User",
        };
        transcript.push_str(&format!("{}: {}\n\n", speaker, msg.content));
    }

    Ok(format!(
        "{}\n\n{}User: {}\n\nAssistant:",
        system, transcript, last.content
    ))
}

fn parse_response(body: &str) -> Result<BackendReply> {
    let json: Value = serde_json::from_str(body)?;
    let parts = json
        .get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get("parts"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::backend(NAME, "response missing candidates[0].content.parts"))?;

    let content: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    let usage = json.get("usageMetadata").map(|u| Usage {
        prompt_tokens: u.get("promptTokenCount").and_then(Value::as_u64),
        completion_tokens: u.get("candidatesTokenCount").and_then(Value::as_u64),
        total_tokens: u.get("totalTokenCount").and_then(Value::as_u64),
    });

    Ok(BackendReply {
        message: ConversationMessage::assistant(content),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ends_with_assistant_cue() {
        let conv = vec![
            ConversationMessage::user("What is a cell?"),
            ConversationMessage::assistant("What do you already know?"),
            ConversationMessage::user("it is small"),
        ];
        let prompt = build_prompt(&conv, Mode::Socratic, 0.0).unwrap();
        assert!(prompt.starts_with("You are an expert educational AI assistant"));
        assert!(prompt.contains("User: What is a cell?\n\nAssistant: What do you already know?\n\n"));
        assert!(prompt.ends_with("User: it is small\n\nAssistant:"));
    }

    #[test]
    fn test_prompt_skips_leading_system_message() {
        let conv = vec![
            ConversationMessage::system("Answer in French."),
            ConversationMessage::user("hello"),
        ];
        let prompt = build_prompt(&conv, Mode::Direct, 0.0).unwrap();
        assert_eq!(prompt, "Answer in French.\n\nUser: hello\n\nAssistant:");
    }

    #[test]
    fn test_prompt_requires_a_turn() {
        let conv = vec![ConversationMessage::system("only system")];
        assert!(build_prompt(&conv, Mode::Direct, 0.0).is_err());
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Cells are "},{"text":"small."}]}}],"usageMetadata":{"promptTokenCount":7,"candidatesTokenCount":3,"totalTokenCount":10}}"#;
        let reply = parse_response(body).unwrap();
        assert_eq!(reply.message.content, "Cells are small.");
        assert_eq!(reply.usage.unwrap().prompt_tokens, Some(7));
    }

    #[test]
    fn test_parse_response_without_candidates() {
        assert!(parse_response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).is_err());
    }

    #[test]
    fn test_degraded_reply_per_mode() {
        assert_eq!(degraded_reply(Mode::Socratic), DEGRADED_SOCRATIC_REPLY);
        assert_eq!(degraded_reply(Mode::Direct), DEGRADED_DIRECT_REPLY);
    }
}
