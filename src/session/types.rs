//! Conversation types for Arcanum
//!
//! This module defines the core value types that flow between memory
//! strategies, the agent and completion providers: messages, roles and turns.

use serde::{Deserialize, Serialize};

/// A single message in a conversation.
///
/// Messages are produced transiently when a memory strategy or the agent
/// renders its state into a prompt. They are never persisted on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use arcanum::session::{Message, Role};
    ///
    /// let msg = Message::user("Player: look");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }

    /// Create a new assistant message.
    ///
    /// # Example
    /// ```
    /// use arcanum::session::{Message, Role};
    ///
    /// let msg = Message::assistant("You see ancient ruins.");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
        }
    }

    /// Create a new system message.
    ///
    /// System messages carry the narrator primer and running summaries.
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
        }
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Messages from the player
    User,
    /// Messages from the narrator model
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One recorded exchange: what the player typed and what the narrator replied.
///
/// Turns are immutable once created and are owned by exactly one memory
/// strategy instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    user_input: String,
    response: String,
}

impl Turn {
    /// Create a new turn.
    pub fn new(user_input: &str, response: &str) -> Self {
        Self {
            user_input: user_input.to_string(),
            response: response.to_string(),
        }
    }

    /// The player's input for this turn.
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// The narrator's response for this turn.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Expand this turn into its prompt form: a user message then an
    /// assistant message.
    pub fn to_messages(&self) -> [Message; 2] {
        [
            Message::user(&player_line(&self.user_input)),
            Message::assistant(&self.response),
        ]
    }
}

/// Format raw player input the way it is presented to the narrator.
pub fn player_line(input: &str) -> String {
    format!("Player: {}", input)
}
