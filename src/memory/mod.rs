//! Conversational memory strategies.
//!
//! A memory strategy owns the bounded conversation state that is replayed to
//! the narrator on every turn. Two strategies are provided:
//!
//! - [`SlidingWindowMemory`]: the last N turns verbatim, strict FIFO eviction.
//! - [`RollingSummaryMemory`]: the last N turns verbatim plus a one-sentence
//!   summary of every evicted turn, produced by the completion provider.
//!
//! Callers depend only on the [`ConversationMemory`] trait.

pub mod factory;
pub mod rolling;
pub mod sliding;
pub mod traits;

pub use factory::{create_memory, create_memory_from_config};
pub use rolling::RollingSummaryMemory;
pub use sliding::SlidingWindowMemory;
pub use traits::ConversationMemory;
