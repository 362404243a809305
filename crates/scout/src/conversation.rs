use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolRequest};
use crate::models::role::Role;
use crate::tools::ToolResult;

/// The ordered log of messages sent to the model on every call
///
/// Messages are only ever appended. Tool traffic enters through [`Conversation::commit`], which
/// takes a whole [`Exchange`] so an assistant turn and its tool answers land together.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with a single user message
    pub fn new<S: Into<String>>(user_text: S) -> Self {
        Self {
            messages: vec![Message::user(user_text)],
        }
    }

    pub fn with_system_prompt<P, S>(prompt: P, user_text: S) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            messages: vec![Message::system(prompt), Message::user(user_text)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Text of the most recent assistant message, or `None` when that message has no text
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    /// Append an assistant turn together with the tool messages answering it
    ///
    /// Every request must be answered exactly once, in the order the model emitted them.
    /// Otherwise nothing is appended and an error is returned.
    pub fn commit(&mut self, exchange: Exchange) -> AgentResult<()> {
        exchange.validate()?;
        let Exchange {
            assistant,
            responses,
        } = exchange;
        self.messages.push(assistant);
        self.messages.extend(responses);
        Ok(())
    }
}

/// One assistant message carrying tool requests, plus the answers collected for them
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    assistant: Message,
    responses: Vec<Message>,
}

impl Exchange {
    pub fn new(assistant: Message) -> Self {
        Self {
            assistant,
            responses: Vec::new(),
        }
    }

    pub fn assistant(&self) -> &Message {
        &self.assistant
    }

    pub fn requests(&self) -> &[ToolRequest] {
        &self.assistant.tool_requests
    }

    pub fn responses(&self) -> &[Message] {
        &self.responses
    }

    /// Record the result of running `request`
    pub fn answer(&mut self, request: &ToolRequest, result: &ToolResult) {
        self.responses.push(Message::tool(
            &request.id,
            &request.name,
            result.to_content(),
        ));
    }

    fn validate(&self) -> AgentResult<()> {
        let requests = self.requests();
        if requests.is_empty() {
            return Err(AgentError::Internal(
                "an exchange needs at least one tool request".to_string(),
            ));
        }
        if requests.len() != self.responses.len() {
            return Err(AgentError::Internal(format!(
                "{} tool requests but {} tool responses",
                requests.len(),
                self.responses.len()
            )));
        }
        for (request, response) in requests.iter().zip(&self.responses) {
            if response.tool_call_id.as_deref() != Some(request.id.as_str()) {
                return Err(AgentError::Internal(format!(
                    "tool request {} was answered by {:?}",
                    request.id, response.tool_call_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_requests() -> Message {
        Message::assistant()
            .with_tool_request("a", "search", r#"{"query": "one"}"#)
            .with_tool_request("b", "search", r#"{"query": "two"}"#)
    }

    #[test]
    fn test_new_conversation() {
        let conversation = Conversation::new("Hi");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(conversation.last_assistant_text(), None);

        let conversation = Conversation::with_system_prompt("Be brief", "Hi");
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.messages()[1].content, "Hi");
    }

    #[test]
    fn test_commit_appends_whole_exchange() {
        let mut conversation = Conversation::new("Compare");
        let mut exchange = Exchange::new(two_requests());
        let requests = exchange.requests().to_vec();
        exchange.answer(&requests[0], &ToolResult::success(json!({"n": 1})));
        exchange.answer(&requests[1], &ToolResult::failure("boom"));

        conversation.commit(exchange).unwrap();

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Tool]
        );
        assert_eq!(conversation.messages()[1].tool_requests.len(), 2);
        assert_eq!(conversation.messages()[2].tool_call_id.as_deref(), Some("a"));
        assert_eq!(conversation.messages()[3].content, r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_commit_rejects_missing_answer() {
        let mut conversation = Conversation::new("Compare");
        let mut exchange = Exchange::new(two_requests());
        let first = exchange.requests()[0].clone();
        exchange.answer(&first, &ToolResult::failure("boom"));

        assert!(conversation.commit(exchange).is_err());
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_commit_rejects_reordered_answers() {
        let mut conversation = Conversation::new("Compare");
        let mut exchange = Exchange::new(two_requests());
        let requests = exchange.requests().to_vec();
        exchange.answer(&requests[1], &ToolResult::failure("late"));
        exchange.answer(&requests[0], &ToolResult::failure("early"));

        assert!(conversation.commit(exchange).is_err());
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_commit_rejects_foreign_answer() {
        let mut conversation = Conversation::new("Compare");
        let mut exchange = Exchange::new(two_requests());
        let first = exchange.requests()[0].clone();
        let stray = ToolRequest::new("zzz", "search", r#"{"query": "other"}"#);
        exchange.answer(&first, &ToolResult::failure("boom"));
        exchange.answer(&stray, &ToolResult::failure("boom"));

        let error = conversation.commit(exchange).unwrap_err();
        assert!(matches!(error, AgentError::Internal(_)));
        assert!(error.to_string().contains("tool request b"));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_commit_rejects_text_only_turn() {
        let mut conversation = Conversation::new("Hi");
        let exchange = Exchange::new(Message::assistant().with_text("Hello"));
        assert!(conversation.commit(exchange).is_err());
    }

    #[test]
    fn test_last_assistant_text_is_latest_only() {
        let mut conversation = Conversation::new("Hi");
        let mut exchange = Exchange::new(
            Message::assistant()
                .with_text("Let me check.")
                .with_tool_request("a", "search", "{}"),
        );
        let request = exchange.requests()[0].clone();
        exchange.answer(&request, &ToolResult::failure("boom"));
        conversation.commit(exchange).unwrap();
        assert_eq!(conversation.last_assistant_text(), Some("Let me check."));

        let assistant = Message::assistant().with_tool_request("b", "search", "{}");
        let mut exchange = Exchange::new(assistant);
        let request = exchange.requests()[0].clone();
        exchange.answer(&request, &ToolResult::failure("boom"));
        conversation.commit(exchange).unwrap();
        assert_eq!(conversation.last_assistant_text(), None);
    }
}
