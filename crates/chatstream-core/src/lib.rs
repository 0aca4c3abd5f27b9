//! chatstream Core Domain Types
//!
//! This crate contains the conversation model and the reducer that turns a
//! stream of interpreted chunks into conversation snapshots. It has no
//! dependencies on:
//! - Network/HTTP
//! - Async runtimes
//! - Rendering
//!
//! Everything here is a pure function of its inputs, apart from the
//! timestamps and ids assigned to new messages and tool records.

pub mod chat;
pub mod chunk;
pub mod conversation;
pub mod error;
pub mod ids;
pub mod status;

// Re-export commonly used types
pub use chat::{Author, Message, ToolRecord};
pub use chunk::Chunk;
pub use conversation::{Conversation, Reducer, DEFAULT_COMPLETION_SENTINEL};
pub use error::CoreError;
pub use ids::{ThreadId, ToolRecordId};
pub use status::{MessageState, Phase};
