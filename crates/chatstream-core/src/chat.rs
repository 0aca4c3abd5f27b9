//! Chat message types for conversation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ToolRecordId;
use crate::status::{MessageState, Phase};

/// Author of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    /// Message typed by the user.
    User,
    /// Message produced by the assistant.
    Bot,
    /// Message injected by the client itself.
    System,
}

/// Result of one tool invocation, attached to a bot message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Unique record identifier.
    pub id: ToolRecordId,
    /// Raw tool output text.
    pub content: String,
    /// `content` parsed as JSON, if it parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
    /// When the tool output arrived.
    pub observed_at: DateTime<Utc>,
}

impl ToolRecord {
    /// Record a tool output observed now.
    pub fn new(content: impl Into<String>, structured: Option<Value>) -> Self {
        Self {
            id: ToolRecordId::generate(),
            content: content.into(),
            structured,
            observed_at: Utc::now(),
        }
    }

    /// Text for display: pretty-printed JSON when structured, raw text otherwise.
    pub fn display_text(&self) -> String {
        self.structured
            .as_ref()
            .and_then(|value| serde_json::to_string_pretty(value).ok())
            .unwrap_or_else(|| self.content.clone())
    }
}

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote this message.
    pub author: Author,
    /// Message text. While in flight this is either a status line or the
    /// response streamed so far, depending on the phase.
    pub content: String,
    /// Lifecycle state.
    pub state: MessageState,
    /// Tool outputs collected while the message was in flight.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_records: Vec<ToolRecord>,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
    /// Response text streamed so far, kept apart from status text. `None`
    /// until the first stream chunk, even an empty one, arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) streamed: Option<String>,
}

impl Message {
    fn new(author: Author, content: impl Into<String>, state: MessageState) -> Self {
        Self {
            author,
            content: content.into(),
            state,
            tool_records: Vec::new(),
            created_at: Utc::now(),
            streamed: None,
        }
    }

    /// Create a complete user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Author::User, content, MessageState::Final)
    }

    /// Create a complete bot message.
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Author::Bot, content, MessageState::Final)
    }

    /// Create a complete system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Author::System, content, MessageState::Final)
    }

    /// Create an empty bot message awaiting the response stream.
    pub fn placeholder() -> Self {
        Self::new(Author::Bot, String::new(), MessageState::Placeholder)
    }

    /// Current streaming phase, absent once finalized.
    pub fn phase(&self) -> Option<Phase> {
        self.state.phase()
    }

    /// Returns true if this message is still being assembled.
    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        let user = Message::user("hi");
        assert_eq!(user.author, Author::User);
        assert!(!user.is_in_flight());

        let placeholder = Message::placeholder();
        assert_eq!(placeholder.author, Author::Bot);
        assert!(placeholder.is_in_flight());
        assert!(placeholder.content.is_empty());
        assert!(placeholder.tool_records.is_empty());
        assert_eq!(placeholder.phase(), None);
    }

    #[test]
    fn test_display_text_prefers_structured() {
        let record = ToolRecord::new("{\"a\":1}", Some(json!({"a": 1})));
        assert_eq!(record.display_text(), "{\n  \"a\": 1\n}");

        let raw = ToolRecord::new("plain output", None);
        assert_eq!(raw.display_text(), "plain output");
    }

    #[test]
    fn test_in_flight_stream_buffer_round_trips() {
        let mut message = Message::placeholder();
        message.streamed = Some("Hel".to_string());
        message.content = "Processing results...".to_string();

        let json = serde_json::to_string(&message).unwrap();
        let restored: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, message);
        assert_eq!(restored.streamed.as_deref(), Some("Hel"));
    }

    #[test]
    fn test_final_message_serialization_has_no_stream_buffer() {
        let json = serde_json::to_value(Message::system("note")).unwrap();
        assert_eq!(json["author"], "system");
        assert_eq!(json["state"]["state"], "final");
        assert!(json.get("streamed").is_none());
        assert!(json.get("tool_records").is_none());
    }
}
