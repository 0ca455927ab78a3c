//! Error types for Arcanum
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured provider error classification.
///
/// Provides fine-grained categorization of completion API failures so the
/// retry decorator can decide without string matching.
#[derive(Debug)]
pub enum ProviderError {
    /// 401: Invalid API key or authentication failure
    Auth(String),
    /// 429: Rate limit or quota exceeded
    RateLimit(String),
    /// 402: Payment required or billing issue
    Billing(String),
    /// 500/502/503/504: Server-side errors
    ServerError(String),
    /// 400: Bad request, invalid parameters
    InvalidRequest(String),
    /// 404: Model not found or endpoint not available
    ModelNotFound(String),
    /// Connection or read timeout
    Timeout(String),
    /// 2xx body that is not JSON or carries no recognizable completion text
    MalformedResponse(String),
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::Billing(msg) => write!(f, "Billing error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` if this error is transient and the request should be retried.
    ///
    /// Retryable errors: RateLimit, ServerError, Timeout, MalformedResponse.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_)
                | ProviderError::ServerError(_)
                | ProviderError::Timeout(_)
                | ProviderError::MalformedResponse(_)
        )
    }

    /// Returns the HTTP status code associated with this error, if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::Billing(_) => Some(402),
            ProviderError::ServerError(_) => Some(500),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::Timeout(_) => None,
            ProviderError::MalformedResponse(_) => None,
            ProviderError::Unknown(_) => None,
        }
    }
}

impl From<ProviderError> for ArcanumError {
    fn from(err: ProviderError) -> Self {
        ArcanumError::ProviderTyped(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for Arcanum operations.
#[derive(Error, Debug)]
pub enum ArcanumError {
    /// Configuration-related errors (invalid values, missing credential, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Untyped provider errors (transport failures, unexpected states)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Structured provider error with classification for retry decisions.
    #[error("Provider error: {0}")]
    ProviderTyped(ProviderError),

    /// A memory strategy could not record a turn (e.g. summary compression failed).
    #[error("Memory error: {message}")]
    Memory {
        message: String,
        #[source]
        source: Option<Box<ArcanumError>>,
    },

    /// Scenario loading or execution errors
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// A benchmark job panicked or was cancelled
    #[error("Job error: {0}")]
    Job(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization errors (scenario files)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ArcanumError {
    /// Wrap an error raised while a memory strategy was recording a turn.
    pub fn memory(message: impl Into<String>, source: ArcanumError) -> Self {
        ArcanumError::Memory {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Render this error followed by every `source()` in its chain.
    ///
    /// Used for error logs, where the full causal trace matters more than
    /// a single line.
    pub fn diagnostic_chain(&self) -> String {
        let mut out = self.to_string();
        let mut current: Option<&(dyn std::error::Error + 'static)> =
            std::error::Error::source(self);
        while let Some(cause) = current {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            current = cause.source();
        }
        out
    }
}

/// A specialized `Result` type for Arcanum operations.
pub type Result<T> = std::result::Result<T, ArcanumError>;
