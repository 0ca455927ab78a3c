//! Context builder for narrator conversations
//!
//! This module provides the `ContextBuilder` for assembling the message list
//! sent on every turn: the static primer, the rendered memory, then the new
//! player line.

use crate::session::{player_line, Message};

/// Default narrator primer: reply schema plus world lore.
pub const STATIC_PRIMER: &str = r#"You are the narrator of a text-based adventure game. You MUST reply with valid JSON following this schema exactly and nothing else:
{
  "description": "<scene text>",
  "choices": ["<option1>", "<option2>", "<option3>", ...]
}

World Primer:
  - You find yourself in the ancient ruins of Arcanum.
  - There are mysterious inscriptions on the stone walls.
  - A cold wind whispers through the broken columns.

Begin the adventure!"#;

/// Builder for the per-turn narrator prompt.
///
/// # Example
/// ```rust
/// use arcanum::agent::ContextBuilder;
/// use arcanum::session::Message;
///
/// let builder = ContextBuilder::new().with_system_prompt("You narrate.");
/// let history = vec![Message::user("Player: look"), Message::assistant("Ruins.")];
/// let messages = builder.build_messages(history, "north");
/// assert_eq!(messages.len(), 4);
/// assert_eq!(messages[3].content, "Player: north");
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
}

impl ContextBuilder {
    /// Create a new context builder with [`STATIC_PRIMER`].
    pub fn new() -> Self {
        Self {
            system_prompt: STATIC_PRIMER.to_string(),
        }
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Build the system message carrying the primer.
    pub fn build_system_message(&self) -> Message {
        Message::system(&self.system_prompt)
    }

    /// Build the full message list for one turn.
    ///
    /// `history` is the rendered memory; `user_input` is the raw player input
    /// and is prefixed with `Player: `.
    pub fn build_messages(&self, history: Vec<Message>, user_input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(self.build_system_message());
        messages.extend(history);
        messages.push(Message::user(&player_line(user_input)));
        messages
    }

    /// Get the current system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn test_default_prompt_is_static_primer() {
        let builder = ContextBuilder::new();
        assert_eq!(builder.system_prompt(), STATIC_PRIMER);
        assert!(builder.system_prompt().contains("ruins of Arcanum"));
        assert!(builder.system_prompt().contains("\"choices\""));
    }

    #[test]
    fn test_build_messages_order() {
        let builder = ContextBuilder::new();
        let history = vec![Message::user("Player: look"), Message::assistant("Ruins.")];
        let messages = builder.build_messages(history, "read inscription");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Player: look");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3], Message::user("Player: read inscription"));
    }

    #[test]
    fn test_build_messages_empty_history() {
        let builder = ContextBuilder::new().with_system_prompt("primer");
        let messages = builder.build_messages(Vec::new(), "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "primer");
        assert_eq!(messages[1].content, "Player: ");
    }
}
