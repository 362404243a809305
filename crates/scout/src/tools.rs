//! Tool executors the agent can offer to the model
//!
//! Executors are boundary adapters: whatever happens on the network, they hand back a
//! [`ToolResult`] that can be serialized into the conversation. Failures are data here,
//! the model reads them and decides what to do next.
pub mod fetch;
pub mod search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};

pub use fetch::PageFetcher;
pub use search::{SearchConfig, SearchTool};

/// Per request timeout applied to every outbound tool call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of running a tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// Tool specific payload, forwarded to the model as is
    Success(Value),
    Failure {
        error: String,
        /// Echo of the original input, e.g. `("query", "rust")`
        context: Option<(String, String)>,
    },
}

impl ToolResult {
    pub fn success(value: Value) -> Self {
        ToolResult::Success(value)
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        ToolResult::Failure {
            error: error.into(),
            context: None,
        }
    }

    /// A failure that echoes the input the tool was called with
    pub fn failure_with<S, K, V>(error: S, key: K, value: V) -> Self
    where
        S: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        ToolResult::Failure {
            error: error.into(),
            context: Some((key.into(), value.into())),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Failure { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Failure { error, .. } => Some(error),
            ToolResult::Success(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolResult::Success(value) => value.clone(),
            ToolResult::Failure { error, context } => {
                let mut object = Map::new();
                object.insert("error".to_string(), Value::String(error.clone()));
                if let Some((key, value)) = context {
                    object.insert(key.clone(), Value::String(value.clone()));
                }
                Value::Object(object)
            }
        }
    }

    /// Text placed in the tool message sent back to the model
    pub fn to_content(&self) -> String {
        self.to_value().to_string()
    }
}

impl From<AgentError> for ToolResult {
    fn from(error: AgentError) -> Self {
        ToolResult::failure(error.to_string())
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchPageArgs {
    pub url: String,
}

/// Typed arguments of every tool this crate knows how to run
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Search(SearchArgs),
    FetchPage(FetchPageArgs),
}

impl ToolInput {
    /// Validate a parsed tool call against the argument record of its tool
    pub fn from_call(call: &ToolCall) -> AgentResult<Self> {
        match call.name.as_str() {
            search::NAME => parse_args(call).map(ToolInput::Search),
            fetch::NAME => parse_args(call).map(ToolInput::FetchPage),
            other => Err(AgentError::ToolNotFound(other.to_string())),
        }
    }

    /// Whether `name` has an argument record, i.e. whether a call to it can be dispatched
    pub fn supports(name: &str) -> bool {
        matches!(name, search::NAME | fetch::NAME)
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolInput::Search(_) => search::NAME,
            ToolInput::FetchPage(_) => fetch::NAME,
        }
    }
}

/// Human readable description of a failed outbound call made by `action`
pub(crate) fn describe_transport_error(
    action: &str,
    error: &reqwest::Error,
    timeout: Duration,
) -> String {
    if error.is_timeout() {
        format!("{} timed out after {} seconds", action, timeout.as_secs())
    } else if let Some(status) = error.status() {
        format!("{} failed with HTTP status {}", action, status.as_u16())
    } else {
        format!("{} failed: {}", action, error)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> AgentResult<T> {
    serde_json::from_value(call.arguments.clone())
        .map_err(|e| AgentError::InvalidParameters(format!("{} for tool {}", e, call.name)))
}

/// A tool the registry can advertise and run
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Schema advertised to the model
    fn schema(&self) -> Tool;

    /// Run the tool. Implementations never fail, errors are reported in the result.
    async fn execute(&self, input: ToolInput) -> ToolResult;
}
