//! Providers module - completion clients
//!
//! This module defines the `LLMProvider` trait and common types for talking
//! to chat completion APIs. The concrete client is [`OpenRouterProvider`];
//! [`RetryProvider`] layers exponential-backoff retries over any provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use arcanum::providers::{ChatOptions, LLMProvider, OpenRouterProvider, RetryProvider};
//! use arcanum::session::Message;
//!
//! async fn example() {
//!     let provider = RetryProvider::new(Box::new(OpenRouterProvider::new(
//!         "your-api-key",
//!         "deepseek/deepseek-chat-v3-0324",
//!     )));
//!     let messages = vec![Message::user("Player: look")];
//!     let response = provider.chat(messages, ChatOptions::creative()).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod openrouter;
pub mod retry;
mod types;

use crate::error::ProviderError;

pub use openrouter::OpenRouterProvider;
pub use retry::RetryProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, Usage, DEFAULT_MAX_TOKENS};

/// Parse an HTTP status code and response body into a structured [`ProviderError`].
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(body.to_string()),
        402 => ProviderError::Billing(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        408 => ProviderError::Timeout(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_error_auth() {
        assert!(matches!(
            parse_provider_error(401, "invalid api key"),
            ProviderError::Auth(_)
        ));
        assert!(matches!(
            parse_provider_error(403, "forbidden"),
            ProviderError::Auth(_)
        ));
    }

    #[test]
    fn test_parse_provider_error_429() {
        let err = parse_provider_error(429, "rate limited");
        assert!(matches!(err, ProviderError::RateLimit(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_provider_error_400() {
        let err = parse_provider_error(400, "bad json");
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_provider_error_5xx() {
        for status in [500, 502, 503, 504] {
            let err = parse_provider_error(status, "upstream");
            assert!(matches!(err, ProviderError::ServerError(_)));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_parse_provider_error_408_is_timeout() {
        let err = parse_provider_error(408, "request timeout");
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[test]
    fn test_parse_provider_error_unknown() {
        let err = parse_provider_error(418, "i'm a teapot");
        assert!(matches!(err, ProviderError::Unknown(_)));
        assert!(err.to_string().contains("HTTP 418"));
    }
}
