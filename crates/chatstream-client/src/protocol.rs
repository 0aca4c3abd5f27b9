//! Event interpretation for the chat streaming protocol.
//!
//! The server sends one event per line in the form
//! `data: {"type": "<kind>", "content": "<text>"}`. Each line is classified
//! into a [`Chunk`]. Lines that are not events, or whose payload does not
//! parse, are dropped without affecting the conversation.

use chatstream_core::{Chunk, DEFAULT_COMPLETION_SENTINEL};
use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

/// Prefix every event line starts with.
pub const DATA_PREFIX: &str = "data: ";

/// Event payload as sent on the wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Thinking {
        #[serde(default)]
        content: String,
    },
    ToolStart {
        #[serde(default)]
        content: String,
    },
    ToolEnd {
        #[serde(default)]
        content: String,
    },
    Stream {
        #[serde(default)]
        content: String,
    },
}

/// Classifies decoded lines into chunks.
#[derive(Debug, Clone)]
pub struct EventInterpreter {
    completion_sentinel: String,
}

impl Default for EventInterpreter {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_SENTINEL)
    }
}

impl EventInterpreter {
    /// Create an interpreter that skips structured parsing for `completion_sentinel`.
    pub fn new(completion_sentinel: impl Into<String>) -> Self {
        Self {
            completion_sentinel: completion_sentinel.into(),
        }
    }

    /// Interpret one line. Returns `None` for lines that carry no usable event.
    pub fn interpret(&self, line: &str) -> Option<Chunk> {
        let payload = line.strip_prefix(DATA_PREFIX)?;

        let event = match serde_json::from_str::<WireEvent>(payload) {
            Ok(event) => event,
            Err(e) => {
                let preview: String = payload.chars().take(200).collect();
                warn!(error = %e, preview = %preview, "Failed to parse stream event");
                return None;
            }
        };

        let chunk = match event {
            WireEvent::Thinking { content } => Chunk::Thinking { text: content },
            WireEvent::ToolStart { content } => Chunk::ToolStart { text: content },
            WireEvent::ToolEnd { content } => {
                let structured = self.structured_output(&content);
                Chunk::ToolEnd {
                    text: content,
                    structured,
                }
            }
            WireEvent::Stream { content } => Chunk::Stream { text: content },
        };

        trace!(phase = ?chunk.phase(), "Interpreted stream event");
        Some(chunk)
    }

    /// Best-effort JSON parse of a tool output. Never fails; returns `None`
    /// when the text is not JSON.
    fn structured_output(&self, text: &str) -> Option<Value> {
        if text.is_empty() || text == self.completion_sentinel {
            return None;
        }

        let trimmed = text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return None;
        }

        serde_json::from_str(trimmed).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_event_lines_are_ignored() {
        let interpreter = EventInterpreter::default();
        assert_eq!(interpreter.interpret(""), None);
        assert_eq!(interpreter.interpret(": keep-alive"), None);
        assert_eq!(interpreter.interpret("event: message"), None);
        assert_eq!(interpreter.interpret("data:{\"type\":\"stream\",\"content\":\"x\"}"), None);
    }

    #[test]
    fn test_malformed_payloads_are_dropped() {
        let interpreter = EventInterpreter::default();
        assert_eq!(interpreter.interpret("data: {not json"), None);
        assert_eq!(interpreter.interpret("data: {\"type\":\"unknown\",\"content\":\"x\"}"), None);
        assert_eq!(interpreter.interpret("data: {\"content\":\"no type\"}"), None);
    }

    #[test]
    fn test_kinds() {
        let interpreter = EventInterpreter::default();
        assert_eq!(
            interpreter.interpret(r#"data: {"type":"thinking","content":"Agent is thinking..."}"#),
            Some(Chunk::Thinking {
                text: "Agent is thinking...".to_string()
            })
        );
        assert_eq!(
            interpreter.interpret(r#"data: {"type":"tool_start","content":"calling"}"#),
            Some(Chunk::ToolStart {
                text: "calling".to_string()
            })
        );
        assert_eq!(
            interpreter.interpret(r#"data: {"type":"stream","content":"Hel"}"#),
            Some(Chunk::stream("Hel"))
        );
    }

    #[test]
    fn test_tool_end_array_is_structured() {
        let interpreter = EventInterpreter::default();
        let chunk = interpreter.interpret(r#"data: {"type":"tool_end","content":"[1,2,3]"}"#);
        assert_eq!(
            chunk,
            Some(Chunk::ToolEnd {
                text: "[1,2,3]".to_string(),
                structured: Some(json!([1, 2, 3])),
            })
        );
    }

    #[test]
    fn test_tool_end_plain_text_stays_raw() {
        let interpreter = EventInterpreter::default();
        let chunk = interpreter.interpret(r#"data: {"type":"tool_end","content":"not json"}"#);
        assert_eq!(chunk, Some(Chunk::tool_end("not json")));
    }

    #[test]
    fn test_tool_end_broken_json_stays_raw() {
        let interpreter = EventInterpreter::default();
        let chunk = interpreter.interpret(r#"data: {"type":"tool_end","content":"{\"a\": 1"}"#);
        assert_eq!(chunk, Some(Chunk::tool_end("{\"a\": 1")));
    }

    #[test]
    fn test_tool_end_sentinel_is_not_parsed() {
        let interpreter = EventInterpreter::new("[]");
        let chunk = interpreter.interpret(r#"data: {"type":"tool_end","content":"[]"}"#);
        assert_eq!(chunk, Some(Chunk::tool_end("[]")));
    }
}
