//! Conversation snapshots and the reducer that folds streamed chunks into them.
//!
//! A [`Conversation`] is an immutable snapshot. Every transition returns a new
//! snapshot that shares all untouched messages with the previous one through
//! `Arc`, so publishing a snapshot to a renderer is cheap and the renderer can
//! never observe a half-applied chunk.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chat::{Author, Message, ToolRecord};
use crate::chunk::Chunk;
use crate::error::CoreError;
use crate::status::{MessageState, Phase};

/// Tool output the upstream agent sends when a tool finished without a
/// result worth showing.
pub const DEFAULT_COMPLETION_SENTINEL: &str = "Agent has finished calling the tool.";

/// Ordered conversation history.
///
/// At most one message is in flight, and it is always the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Arc<Message>>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation opened by a bot greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Arc::new(Message::bot(greeting))],
        }
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last().map(Arc::as_ref)
    }

    /// The in-flight bot message, if a response is being assembled.
    pub fn in_flight(&self) -> Option<&Message> {
        self.last()
            .filter(|m| m.author == Author::Bot && m.is_in_flight())
    }

    /// Returns true if any user message has been submitted.
    pub fn has_user_messages(&self) -> bool {
        self.messages.iter().any(|m| m.author == Author::User)
    }

    /// Append a user message followed by an empty bot placeholder.
    pub fn begin_exchange(&self, prompt: impl Into<String>) -> Result<Self, CoreError> {
        if self.in_flight().is_some() {
            return Err(CoreError::ExchangeInFlight);
        }

        let mut messages = self.messages.clone();
        messages.push(Arc::new(Message::user(prompt)));
        messages.push(Arc::new(Message::placeholder()));
        Ok(Self { messages })
    }

    /// Produce a new snapshot with the in-flight message replaced by `update`'s result.
    fn with_in_flight<F>(&self, update: F) -> Result<Self, CoreError>
    where
        F: FnOnce(&mut Message),
    {
        let current = self.in_flight().ok_or(CoreError::NoMessageInFlight)?;

        let mut next = current.clone();
        update(&mut next);

        let mut messages = self.messages.clone();
        let last = messages.len() - 1;
        messages[last] = Arc::new(next);
        Ok(Self { messages })
    }

    /// Close the in-flight message, keeping its tool records.
    ///
    /// The content becomes the streamed text if any stream chunk arrived,
    /// otherwise the last status text stays.
    pub fn finalize(&self) -> Result<Self, CoreError> {
        self.with_in_flight(|message| {
            if let Some(streamed) = message.streamed.take() {
                message.content = streamed;
            }
            message.state = MessageState::Final;
        })
    }

    /// Replace the in-flight message with a final bot message holding `error_text`.
    pub fn fail(&self, error_text: &str) -> Result<Self, CoreError> {
        self.with_in_flight(|message| {
            message.content = error_text.to_string();
            message.tool_records.clear();
            message.streamed = None;
            message.state = MessageState::Final;
        })
    }
}

/// Applies chunks to the in-flight message of a conversation.
#[derive(Debug, Clone)]
pub struct Reducer {
    completion_sentinel: String,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_SENTINEL)
    }
}

impl Reducer {
    /// Create a reducer that treats `completion_sentinel` as an empty tool result.
    pub fn new(completion_sentinel: impl Into<String>) -> Self {
        Self {
            completion_sentinel: completion_sentinel.into(),
        }
    }

    /// Returns true if a tool_end text is a real tool output.
    pub fn is_tool_output(&self, text: &str) -> bool {
        !text.is_empty() && text != self.completion_sentinel
    }

    /// Fold one chunk into the conversation, returning the next snapshot.
    pub fn apply(&self, conversation: &Conversation, chunk: Chunk) -> Result<Conversation, CoreError> {
        let phase = chunk.phase();
        trace!(?phase, text_len = chunk.text().len(), "Applying chunk");

        conversation.with_in_flight(|message| {
            message.state = MessageState::Active(phase);

            match chunk {
                Chunk::Stream { text } => {
                    let streamed = message.streamed.get_or_insert_with(String::new);
                    streamed.push_str(&text);
                    message.content = streamed.clone();
                }
                Chunk::ToolEnd { text, structured } => {
                    if self.is_tool_output(&text) {
                        message.tool_records.push(ToolRecord::new(text, structured));
                    }
                    message.content = status_text(phase);
                }
                Chunk::Thinking { .. } | Chunk::ToolStart { .. } => {
                    message.content = status_text(phase);
                }
            }
        })
    }
}

fn status_text(phase: Phase) -> String {
    phase.status_text().unwrap_or_default().to_string()
}
