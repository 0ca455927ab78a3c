//! Narrator agent
//!
//! One [`Agent`] plays one session: it owns its memory, shares its provider,
//! and turns each player input into exactly one completion call.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::memory::ConversationMemory;
use crate::providers::{ChatOptions, LLMProvider};

use super::context::ContextBuilder;

/// A narrator bound to one provider and one memory.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use arcanum::agent::{Agent, STATIC_PRIMER};
/// use arcanum::memory::SlidingWindowMemory;
/// use arcanum::providers::OpenRouterProvider;
///
/// let provider = Arc::new(OpenRouterProvider::new("sk-or-xxx", "openai/gpt-4o"));
/// let memory = Box::new(SlidingWindowMemory::new(4)?);
/// let mut agent = Agent::new(provider, memory, STATIC_PRIMER).with_deterministic(true);
/// let reply = agent.step("look around").await?;
/// ```
pub struct Agent {
    provider: Arc<dyn LLMProvider>,
    memory: Box<dyn ConversationMemory>,
    context: ContextBuilder,
    deterministic: bool,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.provider.model())
            .field("memory", &self.memory.name())
            .field("turns", &self.memory.len())
            .field("deterministic", &self.deterministic)
            .finish()
    }
}

impl Agent {
    /// Create an agent using `primer` as the system prompt.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        memory: Box<dyn ConversationMemory>,
        primer: &str,
    ) -> Self {
        Self {
            provider,
            memory,
            context: ContextBuilder::new().with_system_prompt(primer),
            deterministic: false,
        }
    }

    /// Use temperature 0 / top_p 1 sampling for every step.
    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Whether deterministic sampling is enabled.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// The memory strategy backing this agent.
    pub fn memory(&self) -> &dyn ConversationMemory {
        self.memory.as_ref()
    }

    /// The provider serving this agent.
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    fn options(&self) -> ChatOptions {
        if self.deterministic {
            ChatOptions::deterministic()
        } else {
            ChatOptions::creative()
        }
    }

    /// Play one turn and return the narrator's reply.
    ///
    /// Memory is updated only after the provider succeeds. Provider errors are
    /// returned as-is; retries belong to the provider.
    pub async fn step(&mut self, user_input: &str) -> Result<String> {
        let messages = self
            .context
            .build_messages(self.memory.render(), user_input);

        debug!(
            model = self.provider.model(),
            messages = messages.len(),
            memory = self.memory.name(),
            "Narrator step"
        );

        let response = self.provider.chat(messages, self.options()).await?;
        self.memory.add_turn(user_input, &response.content).await?;
        Ok(response.content)
    }
}
