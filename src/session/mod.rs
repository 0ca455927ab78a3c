//! Session module - conversation value types
//!
//! Messages, roles and turns shared by memory strategies, the agent and
//! completion providers.
//!
//! # Example
//!
//! ```
//! use arcanum::session::{Message, Turn};
//!
//! let turn = Turn::new("look", "You see ancient ruins.");
//! let messages = turn.to_messages();
//! assert_eq!(messages[0], Message::user("Player: look"));
//! ```

pub mod types;

pub use types::{player_line, Message, Role, Turn};
