//! Agent module - the narrator
//!
//! An [`Agent`] turns player input into narration. Each step:
//!
//! ```text
//! primer ─┐
//! memory ─┼─> ContextBuilder ─> LLMProvider ─> reply
//! input ──┘                                      │
//!    ▲                                           │
//!    └──────────── memory.add_turn ◄─────────────┘
//! ```

mod context;
mod r#loop;

pub use context::{ContextBuilder, STATIC_PRIMER};
pub use r#loop::Agent;
