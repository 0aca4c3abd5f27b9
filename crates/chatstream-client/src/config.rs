//! Client configuration.

use chatstream_core::DEFAULT_COMPLETION_SENTINEL;

use crate::error::ClientError;

/// Text shown in place of the response when a request fails.
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the chat service.
    pub base_url: String,

    /// Path of the streaming endpoint, relative to `base_url`.
    pub stream_path: String,

    /// Tool output that means "tool finished, nothing to show".
    pub completion_sentinel: String,

    /// Text that replaces the in-flight message when a request fails.
    pub error_message: String,

    /// Bot message the conversation opens with, if any.
    pub greeting: Option<String>,

    /// TCP connect timeout (seconds).
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:6500".to_string(),
            stream_path: "/stream".to_string(),
            completion_sentinel: DEFAULT_COMPLETION_SENTINEL.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            greeting: None,
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the streaming endpoint path.
    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Set the tool completion sentinel.
    pub fn with_completion_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.completion_sentinel = sentinel.into();
        self
    }

    /// Set the error text shown on failed requests.
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Open conversations with a bot greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Check that the configuration can be used to build a client.
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ClientError::InvalidConfig("base URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        Ok(())
    }

    /// Full URL of the streaming endpoint.
    pub fn stream_url(&self) -> String {
        self.endpoint(&self.stream_path)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        self.endpoint("/health")
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.stream_url(), "http://127.0.0.1:6500/stream");
        assert_eq!(config.completion_sentinel, DEFAULT_COMPLETION_SENTINEL);
        assert_eq!(config.error_message, DEFAULT_ERROR_MESSAGE);
        assert!(config.greeting.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_joining() {
        let config = ClientConfig::default()
            .with_base_url("https://chat.example.com/api/")
            .with_stream_path("v1/stream");
        assert_eq!(config.stream_url(), "https://chat.example.com/api/v1/stream");
        assert_eq!(config.health_url(), "https://chat.example.com/api/health");
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::default().with_base_url("  ").validate(),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::default().with_base_url("ftp://host").validate(),
            Err(ClientError::InvalidConfig(_))
        ));
    }
}
