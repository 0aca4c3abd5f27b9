//! Transport to the chat service.
//!
//! [`Transport`] is the seam between the orchestrator and the network: it
//! opens one streaming exchange and hands back the raw response body as a
//! stream of byte batches. [`HttpTransport`] is the reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chatstream_core::ThreadId;
use futures_util::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Raw response body of a streaming exchange.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Request body for the streaming endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRequest {
    /// The user's prompt.
    pub messages: String,
    /// Session-scoped conversation identifier.
    pub thread_id: ThreadId,
}

impl StreamRequest {
    /// Create a request for `prompt` in thread `thread_id`.
    pub fn new(prompt: impl Into<String>, thread_id: ThreadId) -> Self {
        Self {
            messages: prompt.into(),
            thread_id,
        }
    }
}

/// Health endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub environment: Option<String>,
}

/// Opens streaming exchanges with the chat service.
///
/// Implementations must report a non-success response as an error from
/// `open_stream`, and any failure while reading the body (including an early
/// close) as an `Err` item in the returned stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response body.
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ClientError>;
}

/// HTTP transport backed by reqwest.
pub struct HttpTransport {
    inner: reqwest::Client,
    stream_url: String,
    health_url: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let inner = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            inner,
            stream_url: config.stream_url(),
            health_url: config.health_url(),
        })
    }

    /// Query the service health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        debug!(url = %self.health_url, "Checking health");

        let response = self.inner.get(&self.health_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: self.health_url.clone(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ClientError> {
        info!(
            url = %self.stream_url,
            thread_id = %request.thread_id,
            prompt_len = request.messages.len(),
            "Opening response stream"
        );

        let response = self
            .inner
            .post(&self.stream_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: self.stream_url.clone(),
            });
        }

        debug!(status = status.as_u16(), "Response stream open");
        Ok(response
            .bytes_stream()
            .map(|batch| batch.map_err(ClientError::from))
            .boxed())
    }
}
