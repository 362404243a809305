use super::role::Role;
use super::tool::ToolCall;
use crate::errors::{AgentError, AgentResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request from the model to run one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Opaque id, unique within one assistant turn
    pub id: String,
    pub name: String,
    /// The arguments exactly as the model wrote them
    pub arguments: String,
}

impl ToolRequest {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw arguments into a tool call. Empty arguments are read as `{}`.
    pub fn tool_call(&self) -> AgentResult<ToolCall> {
        let raw = self.arguments.trim();
        let arguments = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str::<Value>(raw).map_err(|e| {
                AgentError::InvalidParameters(format!(
                    "Could not interpret tool arguments for id {}: {}",
                    self.id, e
                ))
            })?
        };

        if !arguments.is_object() {
            return Err(AgentError::InvalidParameters(format!(
                "Tool arguments for id {} must be a JSON object",
                self.id
            )));
        }

        Ok(ToolCall::new(&self.name, arguments))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    /// Text of the message. May be empty for an assistant message that only requests tools.
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content,
            tool_requests: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn system<S: Into<String>>(text: S) -> Self {
        Self::new(Role::System, text.into())
    }

    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, text.into())
    }

    /// Create an empty assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    /// Create the tool message answering the request with id `tool_call_id`
    pub fn tool<I, N, C>(tool_call_id: I, tool_name: N, content: C) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut message = Self::new(Role::Tool, content.into());
        message.tool_call_id = Some(tool_call_id.into());
        message.tool_name = Some(tool_name.into());
        message
    }

    /// Append text to the message
    pub fn with_text<S: AsRef<str>>(mut self, text: S) -> Self {
        self.content.push_str(text.as_ref());
        self
    }

    /// Add a tool request to the message
    pub fn with_tool_request<I, N, A>(mut self, id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        self.tool_requests
            .push(ToolRequest::new(id, name, arguments));
        self
    }

    pub fn has_tool_requests(&self) -> bool {
        !self.tool_requests.is_empty()
    }
}
