//! Core domain errors.

use thiserror::Error;

/// Errors raised when a conversation transition is not allowed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A chunk or terminal transition arrived with no bot message in flight.
    #[error("no message in flight")]
    NoMessageInFlight,

    /// A new exchange was started while another is still in flight.
    #[error("a response is already in flight")]
    ExchangeInFlight,
}
