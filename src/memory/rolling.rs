//! Rolling-summary memory: recent turns verbatim, older turns compressed.
//!
//! When a turn falls out of the raw window it is condensed into one sentence
//! by the completion provider and appended to a running summary. The summary
//! only ever grows; earlier sentences are never rewritten.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ArcanumError, Result};
use crate::providers::{ChatOptions, LLMProvider};
use crate::session::{Message, Turn};

use super::traits::ConversationMemory;

/// Instruction given to the provider when compressing an evicted turn.
const COMPRESSION_PROMPT: &str = "You maintain the running memory of a text adventure. \
Summarize the following exchange between the player and the narrator in exactly one sentence. \
Keep every concrete fact (names, objects, places, numbers). Reply with the sentence only.";

/// Prefix of the rendered summary message.
pub const SUMMARY_PREFIX: &str = "Story so far: ";

/// Separator placed before each sentence appended to a non-empty summary.
const SUMMARY_SEPARATOR: &str = " ";

/// Hybrid memory retaining `raw_window_size` raw turns plus a cumulative summary.
pub struct RollingSummaryMemory {
    provider: Arc<dyn LLMProvider>,
    options: ChatOptions,
    raw_window_size: usize,
    history: VecDeque<Turn>,
    summary: String,
}

impl std::fmt::Debug for RollingSummaryMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingSummaryMemory")
            .field("model", &self.provider.model())
            .field("raw_window_size", &self.raw_window_size)
            .field("turns", &self.history.len())
            .field("summary_len", &self.summary.len())
            .finish()
    }
}

impl RollingSummaryMemory {
    /// Create a rolling summary memory.
    ///
    /// # Arguments
    /// * `provider` - Completion provider used to compress evicted turns
    /// * `raw_window_size` - Raw turns kept verbatim; zero is rejected
    /// * `options` - Sampling options for compression calls
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        raw_window_size: usize,
        options: ChatOptions,
    ) -> Result<Self> {
        if raw_window_size == 0 {
            return Err(ArcanumError::Config(
                "rolling summary raw window size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            provider,
            options,
            raw_window_size,
            history: VecDeque::with_capacity(raw_window_size + 1),
            summary: String::new(),
        })
    }

    /// Retained raw turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    /// Ask the provider for a one-sentence summary of `turn`.
    async fn compress(&self, turn: &Turn) -> Result<String> {
        let exchange = format!(
            "Player: {}\nNarrator: {}",
            turn.user_input(),
            turn.response()
        );
        let messages = vec![Message::system(COMPRESSION_PROMPT), Message::user(&exchange)];

        let response = self
            .provider
            .chat(messages, self.options.clone())
            .await
            .map_err(|e| ArcanumError::memory("failed to compress evicted turn", e))?;

        let sentence = response.content.split_whitespace().collect::<Vec<_>>().join(" ");
        if sentence.is_empty() {
            return Err(ArcanumError::Memory {
                message: "summary compression returned no text".to_string(),
                source: None,
            });
        }
        Ok(sentence)
    }

    fn append_summary(&mut self, sentence: &str) {
        if !self.summary.is_empty() {
            self.summary.push_str(SUMMARY_SEPARATOR);
        }
        self.summary.push_str(sentence);
    }
}

#[async_trait]
impl ConversationMemory for RollingSummaryMemory {
    fn name(&self) -> &str {
        "rolling"
    }

    async fn add_turn(&mut self, user_input: &str, response: &str) -> Result<()> {
        // Compress before mutating so a failed call leaves the memory untouched.
        if self.history.len() >= self.raw_window_size {
            if let Some(oldest) = self.history.front() {
                let sentence = self.compress(oldest).await?;
                self.history.pop_front();
                self.append_summary(&sentence);
                debug!(
                    summary_len = self.summary.len(),
                    "Evicted turn folded into running summary"
                );
            }
        }
        self.history.push_back(Turn::new(user_input, response));
        Ok(())
    }

    fn render(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(1 + 2 * self.history.len());
        if !self.summary.is_empty() {
            messages.push(Message::system(&format!("{}{}", SUMMARY_PREFIX, self.summary)));
        }
        messages.extend(self.history.iter().flat_map(Turn::to_messages));
        messages
    }

    fn len(&self) -> usize {
        self.history.len()
    }

    fn capacity(&self) -> usize {
        self.raw_window_size
    }

    fn summary(&self) -> Option<&str> {
        if self.summary.is_empty() {
            None
        } else {
            Some(&self.summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::providers::LLMResponse;
    use crate::session::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Summarizer that numbers its sentences and records what it was asked.
    struct CountingSummarizer {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl CountingSummarizer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CountingSummarizer {
        fn name(&self) -> &str {
            "counting"
        }
        fn model(&self) -> &str {
            "counting-model"
        }
        async fn chat(&self, messages: Vec<Message>, _options: ChatOptions) -> Result<LLMResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(last) = messages.last() {
                self.prompts.lock().unwrap().push(last.content.clone());
            }
            Ok(LLMResponse::text(&format!("  Fact {}.\n", n)))
        }
    }

    /// Summarizer that always fails.
    struct BrokenSummarizer;

    #[async_trait]
    impl LLMProvider for BrokenSummarizer {
        fn name(&self) -> &str {
            "broken"
        }
        fn model(&self) -> &str {
            "broken-model"
        }
        async fn chat(&self, _messages: Vec<Message>, _options: ChatOptions) -> Result<LLMResponse> {
            Err(ProviderError::ServerError("503".into()).into())
        }
    }

    fn rolling(provider: Arc<dyn LLMProvider>, window: usize) -> RollingSummaryMemory {
        RollingSummaryMemory::new(provider, window, ChatOptions::deterministic()).unwrap()
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = RollingSummaryMemory::new(
            Arc::new(CountingSummarizer::new()),
            0,
            ChatOptions::deterministic(),
        )
        .unwrap_err();
        assert!(matches!(err, ArcanumError::Config(_)));
    }

    #[tokio::test]
    async fn test_no_eviction_within_window() {
        let summarizer = Arc::new(CountingSummarizer::new());
        let mut memory = rolling(summarizer.clone(), 2);
        memory.add_turn("a", "1").await.unwrap();
        memory.add_turn("b", "2").await.unwrap();

        assert_eq!(memory.len(), 2);
        assert!(memory.summary().is_none());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_eviction_iff_window_exceeded() {
        let summarizer = Arc::new(CountingSummarizer::new());
        let mut memory = rolling(summarizer.clone(), 2);
        for (i, input) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            memory.add_turn(input, "reply").await.unwrap();
            let expected_evictions = (i + 1).saturating_sub(2);
            assert_eq!(summarizer.calls.load(Ordering::SeqCst), expected_evictions);
            assert!(memory.len() <= 2);
        }
    }

    #[tokio::test]
    async fn test_summary_is_append_only() {
        let summarizer = Arc::new(CountingSummarizer::new());
        let mut memory = rolling(summarizer, 1);
        let mut previous = String::new();
        for input in ["a", "b", "c", "d"] {
            memory.add_turn(input, "reply").await.unwrap();
            let current = memory.summary().unwrap_or_default().to_string();
            assert!(current.len() >= previous.len());
            assert!(current.starts_with(&previous));
            previous = current;
        }
        assert_eq!(memory.summary(), Some("Fact 1. Fact 2. Fact 3."));
    }

    #[tokio::test]
    async fn test_oldest_turn_is_the_one_compressed() {
        let summarizer = Arc::new(CountingSummarizer::new());
        let mut memory = rolling(summarizer.clone(), 2);
        memory.add_turn("take lamp", "You take the lamp.").await.unwrap();
        memory.add_turn("north", "A gate.").await.unwrap();
        memory.add_turn("open gate", "It creaks.").await.unwrap();

        let prompts = summarizer.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Player: take lamp"));
        assert!(prompts[0].contains("Narrator: You take the lamp."));

        let inputs: Vec<&str> = memory.turns().map(Turn::user_input).collect();
        assert_eq!(inputs, vec!["north", "open gate"]);
    }

    #[tokio::test]
    async fn test_render_puts_summary_first() {
        let summarizer = Arc::new(CountingSummarizer::new());
        let mut memory = rolling(summarizer, 1);
        memory.add_turn("a", "1").await.unwrap();
        memory.add_turn("b", "2").await.unwrap();

        let messages = memory.render();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Story so far: Fact 1.");
        assert_eq!(messages[1], Message::user("Player: b"));
        assert_eq!(messages[2], Message::assistant("2"));
        assert_eq!(memory.render(), messages);
    }

    #[tokio::test]
    async fn test_compression_failure_propagates_and_preserves_state() {
        let mut memory = rolling(Arc::new(BrokenSummarizer), 1);
        memory.add_turn("a", "1").await.unwrap();

        let err = memory.add_turn("b", "2").await.unwrap_err();
        assert!(matches!(err, ArcanumError::Memory { .. }));
        assert!(err.diagnostic_chain().contains("Server error: 503"));

        let inputs: Vec<&str> = memory.turns().map(Turn::user_input).collect();
        assert_eq!(inputs, vec!["a"]);
        assert!(memory.summary().is_none());
    }
}
