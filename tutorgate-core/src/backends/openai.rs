//! OpenAI-style chat completions adapter.

use super::{provider_error, split_system, TutorBackend};
use crate::config::{GenerationConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::prompts;
use crate::types::{BackendReply, ConversationMessage, Mode, Usage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;

const NAME: &str = "openai";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Adapter for `/v1/chat/completions`.
pub struct OpenAiBackend {
    model: String,
    endpoint: String,
    generation: GenerationConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: &ProviderConfig, generation: GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("openai.api_key (or OPENAI_API_KEY) is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::Config(format!("invalid openai api_key: {}", e)))?,
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
            http,
        })
    }

    fn request_body(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration_level: f32,
    ) -> Value {
        let (caller_system, rest) = split_system(conversation);
        let system = match caller_system {
            Some(msg) => msg.content.clone(),
            None => prompts::system_instruction(mode, frustration_level),
        };

        let mut messages = Vec::with_capacity(rest.len() + 1);
        messages.push(json!({ "role": "system", "content": system }));
        for msg in rest {
            messages.push(json!({ "role": msg.role.as_str(), "content": msg.content }));
        }

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.generation.temperature,
            "max_tokens": self.generation.max_output_tokens,
        })
    }
}

#[async_trait]
impl TutorBackend for OpenAiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration_level: f32,
    ) -> Result<BackendReply> {
        let url = format!("{}/v1/chat/completions", self.endpoint.trim_end_matches('/'));
        let body = self.request_body(conversation, mode, frustration_level);

        let resp = self
            .http
            .post(url)
            .json(&body)
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

fn parse_response(body: &str) -> Result<BackendReply> {
    let json: Value = serde_json::from_str(body)?;
    let content = json
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::backend(NAME, "response missing choices[0].message.content"))?;

    let usage = json.get("usage").map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(Value::as_u64),
        completion_tokens: u.get("completion_tokens").and_then(Value::as_u64),
        total_tokens: u.get("total_tokens").and_then(Value::as_u64),
    });

    Ok(BackendReply {
        message: ConversationMessage::assistant(content),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn backend() -> OpenAiBackend {
        let config = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            timeout_secs: 5,
            ..Default::default()
        };
        OpenAiBackend::new(&config, GenerationConfig::default()).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let config = ProviderConfig::default();
        assert!(OpenAiBackend::new(&config, GenerationConfig::default()).is_err());
    }

    #[test]
    fn test_request_body_prepends_system_instruction() {
        let conv = vec![
            ConversationMessage::user("what is 2+2?"),
            ConversationMessage::assistant("What do you think?").with_mode(Mode::Socratic),
            ConversationMessage::user("just tell me"),
        ];
        let body = backend().request_body(&conv, Mode::Socratic, 4.0);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("Frustration Level: 4/5"));
        assert_eq!(messages[3]["content"], "just tell me");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["model"], DEFAULT_MODEL);
    }

    #[test]
    fn test_request_body_keeps_caller_system_message() {
        let conv = vec![
            ConversationMessage::system("custom"),
            ConversationMessage::user("hi"),
        ];
        let body = backend().request_body(&conv, Mode::Direct, 0.0);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "custom");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Think about pairs."}}],"usage":{"prompt_tokens":10,"completion_tokens":4,"total_tokens":14}}"#;
        let reply = parse_response(body).unwrap();
        assert_eq!(reply.message.role, Role::Assistant);
        assert_eq!(reply.message.content, "Think about pairs.");
        assert_eq!(reply.usage.unwrap().total_tokens, Some(14));
    }

    #[test]
    fn test_parse_response_missing_content() {
        assert!(parse_response(r#"{"choices":[]}"#).is_err());
        assert!(parse_response("not json").is_err());
    }
}
