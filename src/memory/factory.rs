//! Factory for creating the configured conversation memory.

use std::sync::Arc;

use crate::config::{MemoryConfig, MemoryStrategy};
use crate::error::Result;
use crate::providers::{ChatOptions, LLMProvider};

use super::rolling::RollingSummaryMemory;
use super::sliding::SlidingWindowMemory;
use super::traits::ConversationMemory;

/// Token cap for one-sentence summary calls.
const SUMMARY_MAX_TOKENS: u32 = 128;

/// Create a memory of the given strategy and window size.
///
/// For [`MemoryStrategy::Rolling`] the window is the raw window; `provider`
/// compresses evicted turns. The sliding window never calls the provider.
pub fn create_memory(
    strategy: MemoryStrategy,
    window_size: usize,
    provider: Arc<dyn LLMProvider>,
) -> Result<Box<dyn ConversationMemory>> {
    match strategy {
        MemoryStrategy::Sliding => Ok(Box::new(SlidingWindowMemory::new(window_size)?)),
        MemoryStrategy::Rolling => Ok(Box::new(RollingSummaryMemory::new(
            provider,
            window_size,
            ChatOptions::deterministic().with_max_tokens(SUMMARY_MAX_TOKENS),
        )?)),
    }
}

/// Create the memory described by `config`.
pub fn create_memory_from_config(
    config: &MemoryConfig,
    provider: Arc<dyn LLMProvider>,
) -> Result<Box<dyn ConversationMemory>> {
    create_memory(config.strategy, config.effective_window(), provider)
}
