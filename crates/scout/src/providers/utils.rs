use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::models::message::{Message, ToolRequest};
use crate::models::role::Role;
use crate::models::tool::Tool;

lazy_static! {
    static ref INVALID_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
}

/// Convert internal Message format to OpenAI's API message specification
///
/// Assistant messages keep their text even when it is empty, next to the tool calls
/// they carry, and every tool message names the call it answers.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::Assistant => {
                let mut converted = json!({
                    "role": message.role,
                    "content": message.content,
                });
                if message.has_tool_requests() {
                    let tool_calls: Vec<Value> = message
                        .tool_requests
                        .iter()
                        .map(tool_request_to_openai_spec)
                        .collect();
                    converted["tool_calls"] = json!(tool_calls);
                }
                converted
            }
            Role::Tool => json!({
                "role": message.role,
                "tool_call_id": message.tool_call_id,
                "name": message.tool_name.as_deref().map(sanitize_function_name),
                "content": message.content,
            }),
            Role::System | Role::User => json!({
                "role": message.role,
                "content": message.content,
            }),
        })
        .collect()
}

fn tool_request_to_openai_spec(request: &ToolRequest) -> Value {
    json!({
        "id": request.id,
        "type": "function",
        "function": {
            "name": sanitize_function_name(&request.name),
            "arguments": request.arguments,
        }
    })
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
///
/// Tool call arguments are kept as the raw text the model produced; they are parsed
/// when the tool is dispatched.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response: {}", response))?;

    let mut message = Message::assistant();
    if let Some(text) = original.get("content").and_then(|c| c.as_str()) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default();
            let name = tool_call["function"]["name"].as_str().unwrap_or_default();
            // Some compatible backends send the arguments as an object instead of a string
            let arguments = match &tool_call["function"]["arguments"] {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            message = message.with_tool_request(id, name, arguments);
        }
    }

    Ok(message)
}

fn sanitize_function_name(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
