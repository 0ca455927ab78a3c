//! Retry provider - decorator that adds automatic retry with exponential backoff.
//!
//! Wraps any [`LLMProvider`] to transparently retry transient errors such as
//! HTTP 429 (rate limit), 5xx (server errors), timeouts and malformed bodies.
//!
//! # Example
//!
//! ```rust,ignore
//! use arcanum::providers::retry::RetryProvider;
//! use arcanum::providers::openrouter::OpenRouterProvider;
//!
//! let inner = OpenRouterProvider::new("api-key", "openai/gpt-4o");
//! let provider = RetryProvider::new(Box::new(inner))
//!     .with_max_retries(2)
//!     .with_base_delay_ms(500);
//! ```

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ArcanumError, Result};
use crate::session::Message;

use super::{ChatOptions, LLMProvider, LLMResponse};

/// Patterns in untyped error messages that indicate a transient failure.
const RETRYABLE_PATTERNS: &[&str] = &[
    "429",
    "500",
    "502",
    "503",
    "504",
    "rate limit",
    "overloaded",
    "too many requests",
    "server error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
];

/// A decorator provider that retries transient errors with exponential backoff.
///
/// The request is attempted at most `max_retries + 1` times. The default of
/// two retries gives three attempts in total, after which the last error is
/// surfaced unchanged. Non-transient errors (400, 401, 402, 404) are returned
/// immediately.
pub struct RetryProvider {
    /// The wrapped provider that performs actual requests.
    inner: Box<dyn LLMProvider>,
    /// Maximum number of retry attempts before giving up. Default: 2.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff. Default: 1000.
    base_delay_ms: u64,
    /// Maximum delay cap in milliseconds. Default: 30000.
    max_delay_ms: u64,
}

impl std::fmt::Debug for RetryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryProvider")
            .field("inner", &self.inner.name())
            .field("model", &self.inner.model())
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .finish()
    }
}

impl RetryProvider {
    /// Create a new `RetryProvider` wrapping the given inner provider.
    ///
    /// Defaults: 2 retries (3 attempts), 1s base delay, 30s cap.
    pub fn new(inner: Box<dyn LLMProvider>) -> Self {
        Self {
            inner,
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay in milliseconds for exponential backoff.
    ///
    /// The actual delay before retry `n` (0-indexed) is
    /// `min(base_delay_ms * 2^n + jitter, max_delay_ms)`.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay cap in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

/// Check whether an [`ArcanumError`] represents a transient failure that should be retried.
///
/// Typed provider errors delegate to
/// [`ProviderError::is_retryable`](crate::error::ProviderError::is_retryable).
/// Untyped `Provider(String)` errors fall back to substring matching.
pub fn is_retryable(err: &ArcanumError) -> bool {
    match err {
        ArcanumError::ProviderTyped(pe) => pe.is_retryable(),
        ArcanumError::Provider(_) => {
            let msg = err.to_string().to_lowercase();

            let non_retryable = ["400", "401", "403", "404"];
            if non_retryable.iter().any(|p| msg.contains(p)) {
                return false;
            }

            RETRYABLE_PATTERNS.iter().any(|p| msg.contains(p))
        }
        _ => false,
    }
}

/// Compute the backoff delay for a given attempt (without sleeping).
///
/// # Arguments
/// * `attempt` - The current retry attempt (0-indexed)
/// * `base_delay_ms` - Base delay in milliseconds
/// * `max_delay_ms` - Maximum delay cap in milliseconds
/// * `jitter_ms` - Jitter value to add
pub fn compute_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, jitter_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(16));
    exponential.saturating_add(jitter_ms).min(max_delay_ms)
}

/// Sleep for the backoff delay of a given retry attempt.
///
/// Jitter comes from the sub-second nanoseconds of the system clock, which is
/// enough to decorrelate concurrent benchmark jobs hitting the same endpoint.
pub async fn delay_with_jitter(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) {
    let jitter_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 % (base_delay_ms.max(1)))
        .unwrap_or(0);

    let delay = compute_delay(attempt, base_delay_ms, max_delay_ms, jitter_ms);
    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
}

#[async_trait]
impl LLMProvider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn chat(&self, messages: Vec<Message>, options: ChatOptions) -> Result<LLMResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(messages.clone(), options.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if !is_retryable(&err) || attempt >= self.max_retries {
                        return Err(err);
                    }
                    warn!(
                        model = self.inner.model(),
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %err,
                        "Retrying chat request after transient error"
                    );
                    delay_with_jitter(attempt, self.base_delay_ms, self.max_delay_ms).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails with a configurable error for the first `failures` calls.
    struct FlakyProvider {
        failures: u32,
        retryable: bool,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn model(&self) -> &str {
            "flaky-model"
        }

        async fn chat(&self, _messages: Vec<Message>, _options: ChatOptions) -> Result<LLMResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.retryable {
                    Err(ProviderError::ServerError("503".into()).into())
                } else {
                    Err(ProviderError::Auth("bad key".into()).into())
                }
            } else {
                Ok(LLMResponse::text("ok"))
            }
        }
    }

    fn flaky(failures: u32, retryable: bool) -> (RetryProvider, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = RetryProvider::new(Box::new(FlakyProvider {
            failures,
            retryable,
            calls: Arc::clone(&calls),
        }))
        .with_base_delay_ms(1)
        .with_max_delay_ms(5);
        (provider, calls)
    }

    #[test]
    fn test_retry_provider_defaults() {
        let (provider, _) = flaky(0, true);
        let provider = provider.with_base_delay_ms(1000).with_max_delay_ms(30_000);
        assert_eq!(provider.name(), "flaky");
        assert_eq!(provider.model(), "flaky-model");
        assert_eq!(provider.max_retries, 2);
        assert_eq!(provider.base_delay_ms, 1000);
        assert_eq!(provider.max_delay_ms, 30_000);
    }

    #[test]
    fn test_is_retryable_typed() {
        assert!(is_retryable(&ProviderError::RateLimit("x".into()).into()));
        assert!(is_retryable(
            &ProviderError::MalformedResponse("x".into()).into()
        ));
        assert!(!is_retryable(&ProviderError::Auth("x".into()).into()));
    }

    #[test]
    fn test_is_retryable_untyped_patterns() {
        assert!(is_retryable(&ArcanumError::Provider(
            "HTTP 502 Bad Gateway".into()
        )));
        assert!(!is_retryable(&ArcanumError::Provider(
            "HTTP 401 Unauthorized".into()
        )));
        assert!(!is_retryable(&ArcanumError::Provider(
            "connection refused".into()
        )));
        assert!(!is_retryable(&ArcanumError::Config("503".into())));
    }

    #[test]
    fn test_compute_delay_is_exponential_base_two() {
        assert_eq!(compute_delay(0, 1000, 30_000, 0), 1000);
        assert_eq!(compute_delay(1, 1000, 30_000, 0), 2000);
        assert_eq!(compute_delay(2, 1000, 30_000, 0), 4000);
        assert_eq!(compute_delay(10, 1000, 30_000, 0), 30_000);
        assert_eq!(compute_delay(1, 1000, 30_000, 250), 2250);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let (provider, calls) = flaky(2, true);
        let response = provider.chat(vec![], ChatOptions::new()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let (provider, calls) = flaky(10, true);
        let err = provider.chat(vec![], ChatOptions::new()).await.unwrap_err();
        assert!(err.to_string().contains("Server error"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_immediately() {
        let (provider, calls) = flaky(10, false);
        let err = provider.chat(vec![], ChatOptions::new()).await.unwrap_err();
        assert!(err.to_string().contains("Authentication error"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
