//! Configuration type definitions for Arcanum
//!
//! This module defines all configuration structs used throughout the crate.
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};

use crate::providers::openrouter::OPENROUTER_API_URL;

/// Main configuration struct for Arcanum
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion provider settings (credential, endpoint, retries)
    pub provider: ProviderConfig,
    /// Conversation memory settings
    pub memory: MemoryConfig,
    /// Benchmark executor settings
    pub bench: BenchConfig,
    /// Window-size sweep settings
    pub sweep: SweepConfig,
    /// Logging output settings
    pub logging: LoggingConfig,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Default model for interactive play and single-provider runs.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324";

/// Completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Bearer credential. Also read from `OPENROUTER_API_KEY`.
    pub api_key: Option<String>,
    /// API base URL
    pub api_base: String,
    /// Model used when no provider list is given
    pub default_model: String,
    /// Retries after the first attempt for transient errors
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (doubles per retry)
    pub base_delay_ms: u64,
    /// Backoff delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Per-request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: OPENROUTER_API_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            timeout_secs: None,
        }
    }
}

// ============================================================================
// Memory Configuration
// ============================================================================

/// Which conversation memory strategy an agent uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryStrategy {
    /// Raw FIFO window of recent turns
    #[default]
    Sliding,
    /// Raw window plus a running summary of evicted turns
    Rolling,
}

impl std::fmt::Display for MemoryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryStrategy::Sliding => write!(f, "sliding"),
            MemoryStrategy::Rolling => write!(f, "rolling"),
        }
    }
}

impl std::str::FromStr for MemoryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sliding" | "sliding-window" | "window" => Ok(Self::Sliding),
            "rolling" | "rolling-summary" | "summary" => Ok(Self::Rolling),
            _ => Err(format!(
                "invalid memory strategy: {} (expected sliding or rolling)",
                s
            )),
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory strategy
    pub strategy: MemoryStrategy,
    /// Turns kept by the sliding window
    pub window_size: usize,
    /// Raw turns kept by the rolling summary
    pub raw_window_size: usize,
}

impl MemoryConfig {
    /// Window size that applies to the configured strategy.
    pub fn effective_window(&self) -> usize {
        match self.strategy {
            MemoryStrategy::Sliding => self.window_size,
            MemoryStrategy::Rolling => self.raw_window_size,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            strategy: MemoryStrategy::Sliding,
            window_size: 4,
            raw_window_size: 4,
        }
    }
}

// ============================================================================
// Benchmark Configuration
// ============================================================================

/// Benchmark executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Force temperature 0 / top_p 1 sampling for every narrator call
    pub deterministic: bool,
    /// Concurrent jobs
    pub max_workers: usize,
    /// Directory receiving per-job JSON logs and error logs
    pub log_dir: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            deterministic: true,
            max_workers: 1,
            log_dir: "logs".to_string(),
        }
    }
}

// ============================================================================
// Sweep Configuration
// ============================================================================

/// How the window-size sweep descends from the maximum window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// Stop at the first window that misses full recall.
    /// Assumes recall is monotonic in window size.
    #[default]
    StopAtFirstFailure,
    /// Probe every window down to the minimum and report the smallest that passed.
    Exhaustive,
}

impl std::fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStrategy::StopAtFirstFailure => write!(f, "stop_at_first_failure"),
            ProbeStrategy::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

/// Window-size sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Smallest window probed
    pub min_window: usize,
    /// Largest window probed (verified first)
    pub max_window: usize,
    /// Descent policy
    pub probe: ProbeStrategy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_window: 1,
            max_window: 10,
            probe: ProbeStrategy::StopAtFirstFailure,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Output format for tracing events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable tracing output
    Pretty,
    /// Compact single-line text with a `component` field
    #[default]
    Component,
    /// JSON lines
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Optional file receiving log lines (appended)
    pub file: Option<String>,
    /// Default level filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            file: None,
            level: "info".to_string(),
        }
    }
}
