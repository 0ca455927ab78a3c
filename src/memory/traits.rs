//! Trait definition for pluggable conversational memory strategies.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Message;

/// Bounded conversational state rendered into every narrator prompt.
///
/// Each agent owns exactly one instance; nothing is shared across agents or
/// benchmark jobs. Implementations must keep rendering deterministic: two
/// `render()` calls with no `add_turn()` in between return identical output.
#[async_trait]
pub trait ConversationMemory: Send {
    /// Strategy name (e.g., "sliding", "rolling").
    fn name(&self) -> &str;

    /// Record a turn, evicting the oldest raw turn if capacity is exceeded.
    ///
    /// Any work triggered by eviction happens before this returns. On error
    /// the memory is left exactly as it was before the call.
    async fn add_turn(&mut self, user_input: &str, response: &str) -> Result<()>;

    /// Render the current state as prompt messages, oldest first.
    fn render(&self) -> Vec<Message>;

    /// Number of raw turns currently retained.
    fn len(&self) -> usize;

    /// Maximum number of raw turns retained.
    fn capacity(&self) -> usize;

    /// Whether no raw turns are retained.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Running summary of evicted turns, for strategies that keep one.
    fn summary(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal memory that forgets everything.
    struct Amnesia;

    #[async_trait]
    impl ConversationMemory for Amnesia {
        fn name(&self) -> &str {
            "amnesia"
        }
        async fn add_turn(&mut self, _user_input: &str, _response: &str) -> Result<()> {
            Ok(())
        }
        fn render(&self) -> Vec<Message> {
            Vec::new()
        }
        fn len(&self) -> usize {
            0
        }
        fn capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_trait_object_defaults() {
        let mut memory: Box<dyn ConversationMemory> = Box::new(Amnesia);
        memory.add_turn("look", "ruins").await.unwrap();
        assert_eq!(memory.name(), "amnesia");
        assert!(memory.is_empty());
        assert!(memory.summary().is_none());
    }
}
