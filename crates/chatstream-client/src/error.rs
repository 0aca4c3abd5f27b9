//! Error types for the streaming chat client.

use chatstream_core::CoreError;
use thiserror::Error;

/// Errors that can occur while talking to the streaming endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, request or body read failure reported by the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response stream failed or closed early.
    #[error("stream error: {0}")]
    Stream(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The conversation rejected a transition.
    #[error("conversation error: {0}")]
    Conversation(#[from] CoreError),
}
