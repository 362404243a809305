use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured responses for testing
///
/// Every call is recorded, so tests can check what the model was shown.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<Message, String>>>>,
    calls: Arc<Mutex<Vec<(Vec<Message>, Vec<Tool>)>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            calls: Arc::default(),
        }
    }

    /// Queue a failed completion after the configured responses
    pub fn then_fail<S: Into<String>>(self, error: S) -> Self {
        self.responses.lock().unwrap().push_back(Err(error.into()));
        self
    }

    /// Messages and tools passed to each call, in order
    pub fn calls(&self) -> Vec<(Vec<Message>, Vec<Tool>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Message, Usage)> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), tools.to_vec()));

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(message)) => Ok((message, Usage::default())),
            Some(Err(error)) => Err(anyhow!(error)),
            // Return empty response if no more pre-configured responses
            None => Ok((Message::assistant(), Usage::default())),
        }
    }
}
