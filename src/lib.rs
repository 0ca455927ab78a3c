//! Arcanum - text-adventure narrator with pluggable conversation memory and a
//! benchmark harness for measuring how well each memory keeps facts alive.

pub mod agent;
pub mod bench;
pub mod config;
pub mod error;
pub mod memory;
pub mod providers;
pub mod session;
pub mod utils;

pub use agent::{Agent, STATIC_PRIMER};
pub use config::Config;
pub use error::{ArcanumError, ProviderError, Result};
pub use memory::ConversationMemory;
pub use providers::{ChatOptions, LLMProvider, LLMResponse, OpenRouterProvider, RetryProvider};
pub use session::{Message, Role, Turn};
