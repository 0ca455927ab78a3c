//! OpenRouter Provider Implementation
//!
//! This module implements the `LLMProvider` trait for OpenRouter's
//! OpenAI-compatible Chat Completions API, handling message conversion and
//! normalizing the handful of response shapes that upstream models return.
//!
//! # Example
//!
//! ```rust,ignore
//! use arcanum::providers::{openrouter::OpenRouterProvider, ChatOptions, LLMProvider};
//! use arcanum::session::Message;
//!
//! async fn example() {
//!     let provider = OpenRouterProvider::new("your-api-key", "deepseek/deepseek-chat-v3-0324");
//!
//!     let messages = vec![
//!         Message::system("You are the narrator."),
//!         Message::user("Player: look"),
//!     ];
//!
//!     let response = provider
//!         .chat(messages, ChatOptions::deterministic())
//!         .await
//!         .unwrap();
//!
//!     println!("Narrator: {}", response.content);
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ArcanumError, ProviderError, Result};
use crate::session::Message;

use super::{parse_provider_error, ChatOptions, LLMProvider, LLMResponse, Usage};

/// The OpenRouter API endpoint URL.
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

// ============================================================================
// Request Types
// ============================================================================

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    /// Model identifier
    model: &'a str,
    /// Conversation messages (including system)
    messages: Vec<Message>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Top-p (nucleus) sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

// ============================================================================
// OpenRouter Provider
// ============================================================================

/// OpenRouter completion provider.
///
/// One instance targets one model ("provider id" in benchmark terms). The
/// underlying `reqwest::Client` is cheap to clone and can be shared between
/// instances.
pub struct OpenRouterProvider {
    /// Bearer credential
    api_key: String,
    /// API base URL
    api_base: String,
    /// Model identifier sent with each request
    model: String,
    /// HTTP client for making requests
    client: Client,
}

impl OpenRouterProvider {
    /// Create a new provider for `model` against the public OpenRouter endpoint.
    ///
    /// # Example
    /// ```
    /// use arcanum::providers::openrouter::OpenRouterProvider;
    /// use arcanum::providers::LLMProvider;
    ///
    /// let provider = OpenRouterProvider::new("sk-or-xxx", "openai/gpt-4o");
    /// assert_eq!(provider.name(), "openrouter");
    /// assert_eq!(provider.model(), "openai/gpt-4o");
    /// ```
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_client(api_key, OPENROUTER_API_URL, model, Client::new())
    }

    /// Create a provider with a custom base URL and HTTP client.
    ///
    /// Useful for OpenAI-compatible gateways, local servers, or when the client
    /// needs custom timeouts.
    pub fn with_client(api_key: &str, api_base: &str, model: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }
}

// ============================================================================
// Response Normalization
// ============================================================================

/// Pull the completion text out of a response body.
///
/// Accepted shapes, in order:
/// 1. `choices[0].message.content` as a string
/// 2. `choices[0].message.content` as an array of `{type: "text", text}` parts
/// 3. legacy completions `choices[0].text`
/// 4. top-level `output_text`
///
/// An `error` object inside a 2xx body is surfaced as a provider error.
pub(crate) fn extract_content(body: &Value) -> std::result::Result<String, ProviderError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        let status = error
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok());
        return Err(match status {
            Some(code) => parse_provider_error(code, &message),
            None => ProviderError::Unknown(message),
        });
    }

    let choice = body.get("choices").and_then(|c| c.get(0));

    if let Some(content) = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
    {
        match content {
            Value::String(text) => return Ok(text.clone()),
            Value::Array(parts) => {
                let text: String = parts
                    .iter()
                    .filter_map(|p| match p {
                        Value::String(s) => Some(s.as_str()),
                        other => other.get("text").and_then(Value::as_str),
                    })
                    .collect();
                return Ok(text);
            }
            _ => {}
        }
    }

    if let Some(text) = choice.and_then(|c| c.get("text")).and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    Err(ProviderError::MalformedResponse(format!(
        "no completion text in response: {}",
        truncate_body(&body.to_string())
    )))
}

fn extract_usage(body: &Value) -> Option<Usage> {
    let usage = body.get("usage")?;
    let prompt = usage.get("prompt_tokens")?.as_u64()?;
    let completion = usage.get("completion_tokens")?.as_u64()?;
    Some(Usage::new(prompt as u32, completion as u32))
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 300;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

// ============================================================================
// LLMProvider Implementation
// ============================================================================

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    async fn chat(&self, messages: Vec<Message>, options: ChatOptions) -> Result<LLMResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
        };

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "OpenRouter request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ArcanumError::from(ProviderError::Timeout(e.to_string()))
                } else {
                    ArcanumError::Provider(format!("OpenRouter request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(parse_provider_error(status.as_u16(), &truncate_body(&body_text)).into());
        }

        let body: Value = serde_json::from_str(&body_text).map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "non-JSON response ({}): {}",
                e,
                truncate_body(&body_text)
            ))
        })?;

        let content = extract_content(&body)?;
        let mut llm_response = LLMResponse::text(&content);
        if let Some(usage) = extract_usage(&body) {
            llm_response = llm_response.with_usage(usage);
        }

        debug!(model = %self.model, chars = content.len(), "OpenRouter response received");
        Ok(llm_response)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenRouterProvider::new("test-key", "deepseek/deepseek-chat-v3-0324");
        assert_eq!(provider.name(), "openrouter");
        assert_eq!(provider.model(), "deepseek/deepseek-chat-v3-0324");
        assert_eq!(provider.api_base, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_with_client_trims_trailing_slash() {
        let provider =
            OpenRouterProvider::with_client("k", "https://gateway.local/v1/", "m", Client::new());
        assert_eq!(provider.api_base, "https://gateway.local/v1");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "openai/gpt-4o",
            messages: vec![Message::system("primer"), Message::user("Player: look")],
            temperature: Some(0.0),
            top_p: Some(1.0),
            max_tokens: Some(512),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "openai/gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Player: look");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_request_omits_unset_options() {
        let request = ChatRequest {
            model: "m",
            messages: vec![],
            temperature: None,
            top_p: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("top_p"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_extract_content_string() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Ruins."}}]});
        assert_eq!(extract_content(&body).unwrap(), "Ruins.");
    }

    #[test]
    fn test_extract_content_parts_array() {
        let body = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "You see "},
            {"type": "text", "text": "ancient ruins."}
        ]}}]});
        assert_eq!(extract_content(&body).unwrap(), "You see ancient ruins.");
    }

    #[test]
    fn test_extract_content_legacy_text() {
        let body = json!({"choices": [{"text": "A cold wind."}]});
        assert_eq!(extract_content(&body).unwrap(), "A cold wind.");
    }

    #[test]
    fn test_extract_content_output_text() {
        let body = json!({"output_text": "Broken columns."});
        assert_eq!(extract_content(&body).unwrap(), "Broken columns.");
    }

    #[test]
    fn test_extract_content_error_object_with_code() {
        let body = json!({"error": {"message": "upstream overloaded", "code": 502}});
        let err = extract_content(&body).unwrap_err();
        assert!(matches!(err, ProviderError::ServerError(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_extract_content_error_object_without_code() {
        let body = json!({"error": {"message": "something odd"}});
        let err = extract_content(&body).unwrap_err();
        assert!(matches!(err, ProviderError::Unknown(_)));
    }

    #[test]
    fn test_extract_content_missing_is_malformed() {
        let body = json!({"choices": []});
        let err = extract_content(&body).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_extract_usage() {
        let body = json!({"usage": {"prompt_tokens": 12, "completion_tokens": 8}});
        let usage = extract_usage(&body).unwrap();
        assert_eq!(usage.total_tokens, 20);
        assert!(extract_usage(&json!({})).is_none());
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(400);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 303);
    }
}
