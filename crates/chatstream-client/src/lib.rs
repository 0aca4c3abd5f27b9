//! Streaming chat client for chatstream
//!
//! This crate turns the service's line-oriented event stream into
//! conversation snapshots and manages the request lifecycle.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatstream_client::{ChatSession, ClientConfig};
//!
//! async fn ask() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default().with_base_url("http://127.0.0.1:6500");
//!     let session = ChatSession::connect(&config)?;
//!
//!     session.send("What should I eat during the first trimester?").await?;
//!
//!     if let Some(reply) = session.view().conversation.last() {
//!         println!("{}", reply.content);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod decoder;
mod error;
mod protocol;
mod session;
mod transport;

// Re-export main types
pub use config::{ClientConfig, DEFAULT_ERROR_MESSAGE};
pub use decoder::{LineDecoder, Lines};
pub use error::ClientError;
pub use protocol::{EventInterpreter, DATA_PREFIX};
pub use session::{ChatSession, ChatView, SendOutcome, ViewObserver};
pub use transport::{ByteStream, HealthStatus, HttpTransport, StreamRequest, Transport};
