//! Shared helpers for CLI commands.

use anyhow::{Context, Result};

use arcanum::config::{Config, MemoryStrategy};
use arcanum::utils::logging::init_logging;

/// Load `.env`, the config file and env overrides, then install logging.
pub(crate) fn load_config() -> Result<Config> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let config = Config::load()
        .with_context(|| format!("Failed to load configuration from {}", Config::path().display()))?;

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Warning: {}", e);
    }
    Ok(config)
}

/// Trim provider ids and drop empty entries (`a,,b ` -> `[a, b]`).
pub(crate) fn clean_providers(providers: Vec<String>) -> Vec<String> {
    providers
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Apply `--strategy` / `--window-size` to the memory section.
///
/// The window applies to whichever strategy ends up selected.
pub(crate) fn apply_memory_overrides(
    config: &mut Config,
    strategy: Option<MemoryStrategy>,
    window_size: Option<usize>,
) {
    if let Some(strategy) = strategy {
        config.memory.strategy = strategy;
    }
    if let Some(window) = window_size {
        match config.memory.strategy {
            MemoryStrategy::Sliding => config.memory.window_size = window,
            MemoryStrategy::Rolling => config.memory.raw_window_size = window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_providers() {
        let cleaned = clean_providers(vec![" a/x ".into(), "".into(), "b/y".into()]);
        assert_eq!(cleaned, vec!["a/x", "b/y"]);
    }

    #[test]
    fn test_window_follows_selected_strategy() {
        let mut config = Config::default();
        apply_memory_overrides(&mut config, Some(MemoryStrategy::Rolling), Some(7));
        assert_eq!(config.memory.raw_window_size, 7);
        assert_eq!(config.memory.window_size, 4);
        assert_eq!(config.memory.effective_window(), 7);
    }
}
