//! Provider types for Arcanum
//!
//! This module defines the core types and traits for completion providers,
//! including the `LLMProvider` trait, sampling options, and response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Message;

/// Default completion length for narrator and summary calls.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Trait for completion providers.
///
/// A provider takes an ordered list of role-tagged messages plus sampling
/// options and returns generated text. Retry behaviour is layered on with
/// [`RetryProvider`](super::RetryProvider) rather than built into each
/// implementation.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` - The full prompt, oldest first
    /// * `options` - Sampling options (temperature, top_p, max_tokens)
    async fn chat(&self, messages: Vec<Message>, options: ChatOptions) -> Result<LLMResponse>;

    /// Get the model identifier requests are sent to
    /// (e.g., "deepseek/deepseek-chat-v3-0324").
    fn model(&self) -> &str;

    /// Get the provider name (e.g., "openrouter").
    fn name(&self) -> &str;
}

/// Options for chat completion requests.
///
/// Use the builder pattern to construct options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter
    pub top_p: Option<f32>,
}

impl ChatOptions {
    /// Create new default chat options.
    ///
    /// # Example
    /// ```
    /// use arcanum::providers::ChatOptions;
    ///
    /// let options = ChatOptions::new();
    /// assert!(options.max_tokens.is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling used for benchmark runs: temperature 0, top_p 1.
    ///
    /// # Example
    /// ```
    /// use arcanum::providers::ChatOptions;
    ///
    /// let options = ChatOptions::deterministic();
    /// assert_eq!(options.temperature, Some(0.0));
    /// assert_eq!(options.top_p, Some(1.0));
    /// ```
    pub fn deterministic() -> Self {
        Self::new()
            .with_temperature(0.0)
            .with_top_p(1.0)
            .with_max_tokens(DEFAULT_MAX_TOKENS)
    }

    /// Default narrator sampling: temperature 0.7, top_p 1, 512 tokens.
    pub fn creative() -> Self {
        Self::new()
            .with_temperature(0.7)
            .with_top_p(1.0)
            .with_max_tokens(DEFAULT_MAX_TOKENS)
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    ///
    /// Lower values (e.g., 0.2) make output more focused and deterministic.
    /// Higher values (e.g., 0.8) make output more creative and diverse.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p (nucleus sampling) parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Token usage information (if available)
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// Create a simple text response.
    ///
    /// # Example
    /// ```
    /// use arcanum::providers::LLMResponse;
    ///
    /// let response = LLMResponse::text("You see ancient ruins.");
    /// assert_eq!(response.content, "You see ancient ruins.");
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            usage: None,
        }
    }

    /// Set usage information for this response.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Token usage information from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    /// Create new usage information.
    ///
    /// # Example
    /// ```
    /// use arcanum::providers::Usage;
    ///
    /// let usage = Usage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_response_text() {
        let response = LLMResponse::text("Hello, world!");
        assert_eq!(response.content, "Hello, world!");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_llm_response_with_usage() {
        let response = LLMResponse::text("Hello").with_usage(Usage::new(100, 50));
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.completion_tokens, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_chat_options_builder() {
        let options = ChatOptions::new()
            .with_max_tokens(100)
            .with_temperature(0.3)
            .with_top_p(0.9);
        assert_eq!(options.max_tokens, Some(100));
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.top_p, Some(0.9));
    }

    #[test]
    fn test_deterministic_and_creative_presets() {
        let det = ChatOptions::deterministic();
        assert_eq!(det.temperature, Some(0.0));
        assert_eq!(det.top_p, Some(1.0));
        assert_eq!(det.max_tokens, Some(DEFAULT_MAX_TOKENS));

        let creative = ChatOptions::creative();
        assert_eq!(creative.temperature, Some(0.7));
        assert_eq!(creative.top_p, Some(1.0));
        assert_eq!(creative.max_tokens, Some(512));
    }
}
