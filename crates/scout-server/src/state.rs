use scout::agent::Agent;
use std::sync::Arc;

/// Shared application state
///
/// The agent and its tools are built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}
