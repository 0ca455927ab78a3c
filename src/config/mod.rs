//! Configuration management for Arcanum
//!
//! Configuration is loaded from `~/.arcanum/config.json` with environment
//! variable overrides. Every section falls back to its defaults, so an absent
//! file or a partial file is always valid input.

mod types;

pub use types::*;

use crate::error::{ArcanumError, Result};
use std::path::{Path, PathBuf};

/// Environment variable carrying the OpenRouter credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Environment variable selecting the default model.
pub const MODEL_ENV: &str = "OPENROUTER_PROVIDER";

impl Config {
    /// Returns the Arcanum configuration directory path (~/.arcanum)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".arcanum")
    }

    /// Returns the path to the config file (~/.arcanum/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables override config values using the pattern
    /// `ARCANUM_SECTION_KEY`.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored, leaving the current setting.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Provider
        if let Some(val) = lookup(API_KEY_ENV).or_else(|| lookup("ARCANUM_PROVIDER_API_KEY")) {
            if !val.trim().is_empty() {
                self.provider.api_key = Some(val);
            }
        }
        if let Some(val) = lookup("ARCANUM_PROVIDER_API_BASE") {
            self.provider.api_base = val;
        }
        if let Some(val) = lookup(MODEL_ENV).or_else(|| lookup("ARCANUM_PROVIDER_DEFAULT_MODEL")) {
            if !val.trim().is_empty() {
                self.provider.default_model = val;
            }
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_PROVIDER_MAX_RETRIES") {
            self.provider.max_retries = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_PROVIDER_BASE_DELAY_MS") {
            self.provider.base_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_PROVIDER_MAX_DELAY_MS") {
            self.provider.max_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_PROVIDER_TIMEOUT_SECS") {
            self.provider.timeout_secs = Some(v);
        }

        // Memory
        if let Some(v) = parsed(&lookup, "ARCANUM_MEMORY_STRATEGY") {
            self.memory.strategy = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_MEMORY_WINDOW_SIZE") {
            self.memory.window_size = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_MEMORY_RAW_WINDOW_SIZE") {
            self.memory.raw_window_size = v;
        }

        // Bench
        if let Some(v) = parsed(&lookup, "ARCANUM_BENCH_DETERMINISTIC") {
            self.bench.deterministic = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_BENCH_MAX_WORKERS") {
            self.bench.max_workers = v;
        }
        if let Some(val) = lookup("ARCANUM_BENCH_LOG_DIR") {
            self.bench.log_dir = val;
        }

        // Sweep
        if let Some(v) = parsed(&lookup, "ARCANUM_SWEEP_MIN_WINDOW") {
            self.sweep.min_window = v;
        }
        if let Some(v) = parsed(&lookup, "ARCANUM_SWEEP_MAX_WINDOW") {
            self.sweep.max_window = v;
        }

        // Logging
        if let Some(val) = lookup("ARCANUM_LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("ARCANUM_LOGGING_FILE") {
            self.logging.file = Some(val);
        }
    }

    /// Check the configuration for values no component can run with.
    pub fn validate(&self) -> Result<()> {
        if self.memory.window_size == 0 {
            return Err(ArcanumError::Config(
                "memory.window_size must be at least 1".to_string(),
            ));
        }
        if self.memory.raw_window_size == 0 {
            return Err(ArcanumError::Config(
                "memory.raw_window_size must be at least 1".to_string(),
            ));
        }
        if self.bench.max_workers == 0 {
            return Err(ArcanumError::Config(
                "bench.max_workers must be at least 1".to_string(),
            ));
        }
        if self.sweep.min_window == 0 {
            return Err(ArcanumError::Config(
                "sweep.min_window must be at least 1".to_string(),
            ));
        }
        if self.sweep.min_window > self.sweep.max_window {
            return Err(ArcanumError::Config(format!(
                "sweep.min_window ({}) exceeds sweep.max_window ({})",
                self.sweep.min_window, self.sweep.max_window
            )));
        }
        Ok(())
    }

    /// Return the API credential or a fatal configuration error.
    ///
    /// Called before any job is scheduled so a missing key aborts the whole
    /// run instead of failing every job.
    pub fn require_api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ArcanumError::Config(format!(
                    "{} is not set; export it or add provider.api_key to {}",
                    API_KEY_ENV,
                    Self::path().display()
                ))
            })
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
