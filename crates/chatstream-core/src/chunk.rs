//! Normalized units of streamed server output.

use serde_json::Value;

use crate::status::Phase;

/// One interpreted event from the response stream.
///
/// Chunks are transient: each pipeline stage hands them by value to the next
/// and nothing retains them once the reducer has applied them.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// The assistant started reasoning.
    Thinking { text: String },

    /// The assistant started calling tools.
    ToolStart { text: String },

    /// A tool call finished.
    ToolEnd {
        /// Raw tool output as sent by the server.
        text: String,
        /// `text` parsed as JSON, when it looked like and parsed as JSON.
        structured: Option<Value>,
    },

    /// An incremental piece of the response text.
    Stream { text: String },
}

impl Chunk {
    /// Phase the in-flight message enters when this chunk is applied.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Thinking { .. } => Phase::Thinking,
            Self::ToolStart { .. } => Phase::ToolStart,
            Self::ToolEnd { .. } => Phase::ToolEnd,
            Self::Stream { .. } => Phase::Streaming,
        }
    }

    /// Text carried by the chunk.
    pub fn text(&self) -> &str {
        match self {
            Self::Thinking { text }
            | Self::ToolStart { text }
            | Self::ToolEnd { text, .. }
            | Self::Stream { text } => text,
        }
    }

    /// Create a stream chunk.
    pub fn stream(text: impl Into<String>) -> Self {
        Self::Stream { text: text.into() }
    }

    /// Create a tool_end chunk without a structured payload.
    pub fn tool_end(text: impl Into<String>) -> Self {
        Self::ToolEnd {
            text: text.into(),
            structured: None,
        }
    }
}
