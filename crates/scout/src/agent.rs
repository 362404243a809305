use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::conversation::{Conversation, Exchange};
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::Provider;
use crate::registry::ToolRegistry;

pub const DEFAULT_MAX_TURNS: usize = 10;

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I wasn't able to finish answering that. Could you try rephrasing your question?";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on model calls for a single reply
    pub max_turns: usize,
    pub system_prompt: Option<String>,
    /// Returned when the budget runs out and the model never produced any text
    pub fallback_message: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// The final answer handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    /// Tool traffic stays inside the agent, so this is always `None`
    pub tool_calls: Option<Vec<ToolRequest>>,
}

impl ChatReply {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            tool_calls: None,
        }
    }
}

/// Agent integrates a foundational LLM with the tools it can call
///
/// One agent is shared by every request. Each reply builds its own [`Conversation`], so
/// nothing is carried from one request to the next.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// A fresh conversation for `user_message`, with the system prompt if one is configured
    pub fn conversation<S: Into<String>>(&self, user_message: S) -> Conversation {
        match &self.config.system_prompt {
            Some(prompt) => Conversation::with_system_prompt(prompt.clone(), user_message),
            None => Conversation::new(user_message),
        }
    }

    /// Answer a single user message
    pub async fn reply(&self, user_message: &str) -> Result<ChatReply> {
        let (reply, _) = self.run(self.conversation(user_message)).await?;
        Ok(reply)
    }

    /// Drive `conversation` until the model answers or the turn budget runs out
    ///
    /// Tool failures are fed back to the model as tool results. Only a failed model call
    /// ends the run with an error.
    pub async fn run(&self, mut conversation: Conversation) -> Result<(ChatReply, Conversation)> {
        let tools = self.registry.describe();

        for turn in 1..=self.config.max_turns {
            debug!(turn, messages = conversation.len(), "awaiting model");
            let (response, usage) = self
                .provider
                .complete(conversation.messages(), &tools)
                .await
                .with_context(|| format!("Model call failed on turn {}", turn))?;
            debug!(turn, ?usage, "model responded");

            if !response.has_tool_requests() {
                info!(turn, "model answered");
                return Ok((ChatReply::new(response.content), conversation));
            }

            debug!(turn, requests = response.tool_requests.len(), "executing tools");
            let exchange = self.execute_tools(response).await;
            conversation.commit(exchange)?;
        }

        warn!(max_turns = self.config.max_turns, "turn budget exhausted");
        let content = conversation
            .last_assistant_text()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.fallback_message.clone());
        Ok((ChatReply::new(content), conversation))
    }

    /// Run every requested tool in emission order and collect the answers
    async fn execute_tools(&self, assistant: Message) -> Exchange {
        let mut exchange = Exchange::new(assistant);
        let requests = exchange.requests().to_vec();
        for request in &requests {
            let result = self.registry.dispatch(request).await;
            exchange.answer(request, &result);
        }
        exchange
    }
}
