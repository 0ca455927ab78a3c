//! Sliding-window memory: a fixed-capacity FIFO of raw turns.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::{ArcanumError, Result};
use crate::session::{Message, Turn};

use super::traits::ConversationMemory;

/// Keeps the last `window_size` turns verbatim and drops older ones.
///
/// # Example
/// ```rust,ignore
/// use arcanum::memory::{ConversationMemory, SlidingWindowMemory};
///
/// let mut memory = SlidingWindowMemory::new(2)?;
/// memory.add_turn("look", "Ruins.").await?;
/// memory.add_turn("north", "A gate.").await?;
/// memory.add_turn("open gate", "It creaks.").await?;
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.render().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingWindowMemory {
    window_size: usize,
    history: VecDeque<Turn>,
}

impl SlidingWindowMemory {
    /// Create a sliding window holding at most `window_size` turns.
    ///
    /// A window of zero is rejected rather than clamped.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(ArcanumError::Config(
                "sliding window size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            window_size,
            history: VecDeque::with_capacity(window_size + 1),
        })
    }

    /// Retained turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }
}

#[async_trait]
impl ConversationMemory for SlidingWindowMemory {
    fn name(&self) -> &str {
        "sliding"
    }

    async fn add_turn(&mut self, user_input: &str, response: &str) -> Result<()> {
        self.history.push_back(Turn::new(user_input, response));
        while self.history.len() > self.window_size {
            self.history.pop_front();
        }
        Ok(())
    }

    fn render(&self) -> Vec<Message> {
        self.history.iter().flat_map(Turn::to_messages).collect()
    }

    fn len(&self) -> usize {
        self.history.len()
    }

    fn capacity(&self) -> usize {
        self.window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn test_zero_window_rejected() {
        let err = SlidingWindowMemory::new(0).unwrap_err();
        assert!(matches!(err, ArcanumError::Config(_)));
    }

    #[tokio::test]
    async fn test_length_never_exceeds_window() {
        for window in 1..=5 {
            let mut memory = SlidingWindowMemory::new(window).unwrap();
            for i in 0..12 {
                memory
                    .add_turn(&format!("in{}", i), &format!("out{}", i))
                    .await
                    .unwrap();
                assert!(memory.len() <= window);
                assert_eq!(memory.render().len(), 2 * memory.len());
            }
        }
    }

    #[tokio::test]
    async fn test_evicts_oldest_first() {
        let mut memory = SlidingWindowMemory::new(2).unwrap();
        memory.add_turn("a", "1").await.unwrap();
        memory.add_turn("b", "2").await.unwrap();
        memory.add_turn("c", "3").await.unwrap();

        let inputs: Vec<&str> = memory.turns().map(Turn::user_input).collect();
        assert_eq!(inputs, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_render_is_chronological_user_then_assistant() {
        let mut memory = SlidingWindowMemory::new(3).unwrap();
        memory.add_turn("look", "Ruins.").await.unwrap();
        memory.add_turn("north", "A gate.").await.unwrap();

        let messages = memory.render();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("Player: look"));
        assert_eq!(messages[1], Message::assistant("Ruins."));
        assert_eq!(messages[2], Message::user("Player: north"));
        assert_eq!(messages[3].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let mut memory = SlidingWindowMemory::new(2).unwrap();
        memory.add_turn("look", "Ruins.").await.unwrap();
        assert_eq!(memory.render(), memory.render());
    }

    #[test]
    fn test_empty_memory_renders_nothing() {
        let memory = SlidingWindowMemory::new(4).unwrap();
        assert!(memory.is_empty());
        assert!(memory.render().is_empty());
        assert_eq!(memory.capacity(), 4);
    }
}
