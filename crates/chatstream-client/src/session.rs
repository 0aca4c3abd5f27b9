//! Chat session: request lifecycle for one conversation.
//!
//! A [`ChatSession`] owns the conversation and drives each exchange through
//! the pipeline: transport bytes → [`LineDecoder`] → [`EventInterpreter`] →
//! [`Reducer`]. After every applied chunk the new [`ChatView`] is published,
//! both to the registered [`ViewObserver`]s (every snapshot, in order) and to
//! the watch channel (latest snapshot).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chatstream_core::{Chunk, Conversation, CoreError, Reducer, ThreadId};
use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::decoder::LineDecoder;
use crate::error::ClientError;
use crate::protocol::EventInterpreter;
use crate::transport::{HttpTransport, StreamRequest, Transport};

/// Everything a renderer needs to draw the chat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    /// Full ordered conversation.
    pub conversation: Conversation,
    /// True while a response is being streamed.
    pub awaiting: bool,
    /// User-facing error from the last failed request.
    pub error: Option<String>,
}

/// Receives every published view, synchronously and in order.
///
/// Called on the task driving the exchange, so implementations should return
/// quickly.
pub trait ViewObserver: Send + Sync {
    /// Called after each state change.
    fn on_view(&self, view: &ChatView);
}

/// Result of a [`ChatSession::send`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The response streamed to completion.
    Completed,
    /// Another request was in flight; nothing was sent.
    Busy,
}

/// One conversation with the chat service.
pub struct ChatSession {
    transport: Arc<dyn Transport>,
    thread_id: ThreadId,
    interpreter: EventInterpreter,
    reducer: Reducer,
    error_message: String,
    view: watch::Sender<ChatView>,
    observers: Vec<Arc<dyn ViewObserver>>,
    in_flight: AtomicBool,
}

impl ChatSession {
    /// Create a session over an arbitrary transport.
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let conversation = match &config.greeting {
            Some(greeting) => Conversation::with_greeting(greeting.clone()),
            None => Conversation::new(),
        };

        let (view, _) = watch::channel(ChatView {
            conversation,
            awaiting: false,
            error: None,
        });

        let thread_id = ThreadId::generate();
        info!(thread_id = %thread_id, "Chat session created");

        Self {
            transport,
            thread_id,
            interpreter: EventInterpreter::new(config.completion_sentinel.clone()),
            reducer: Reducer::new(config.completion_sentinel.clone()),
            error_message: config.error_message.clone(),
            view,
            observers: Vec::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Create a session talking HTTP to the configured service.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Register an observer for every published view.
    pub fn with_observer(mut self, observer: Arc<dyn ViewObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Identifier sent with every request of this session.
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Subscribe to the latest view.
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view.subscribe()
    }

    /// Current view.
    pub fn view(&self) -> ChatView {
        self.view.borrow().clone()
    }

    /// Returns true while a response is streaming.
    pub fn is_awaiting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Returns true once the user has sent a message.
    pub fn has_started(&self) -> bool {
        self.view.borrow().conversation.has_user_messages()
    }

    /// Send a prompt and stream the response into the conversation.
    ///
    /// Returns `Ok(SendOutcome::Busy)` without doing anything if a request is
    /// already in flight. On transport failure the in-flight message shows
    /// the configured error text and the error is returned; the session is
    /// idle again either way.
    pub async fn send(&self, prompt: &str) -> Result<SendOutcome, ClientError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Request already in flight, ignoring send");
            return Ok(SendOutcome::Busy);
        }

        let result = self.exchange(prompt).await;
        self.in_flight.store(false, Ordering::Release);
        result
    }

    async fn exchange(&self, prompt: &str) -> Result<SendOutcome, ClientError> {
        let started = self.view.borrow().conversation.begin_exchange(prompt)?;
        self.publish(|view| {
            view.conversation = started;
            view.awaiting = true;
            view.error = None;
        });

        match self.drive(prompt).await {
            Ok(chunks) => {
                info!(chunks, "Response stream completed");
                self.finish(|conversation| conversation.finalize(), None);
                Ok(SendOutcome::Completed)
            }
            Err(e) => {
                error!(error = %e, "Streaming failed");
                let message = self.error_message.clone();
                self.finish(|conversation| conversation.fail(&message), Some(message.clone()));
                Err(e)
            }
        }
    }

    /// Run the pipeline until the body ends. Returns the number of chunks applied.
    async fn drive(&self, prompt: &str) -> Result<u64, ClientError> {
        let request = StreamRequest::new(prompt, self.thread_id.clone());
        let mut body = self.transport.open_stream(&request).await?;

        let mut decoder = LineDecoder::new();
        let mut applied = 0u64;

        while let Some(batch) = body.next().await {
            let bytes = batch?;
            for line in decoder.push(&bytes) {
                if let Some(chunk) = self.interpreter.interpret(&line) {
                    self.apply(chunk);
                    applied += 1;
                }
            }
        }

        decoder.finish();
        Ok(applied)
    }

    fn apply(&self, chunk: Chunk) {
        let next = self.reducer.apply(&self.view.borrow().conversation, chunk);
        match next {
            Ok(conversation) => self.publish(|view| view.conversation = conversation),
            Err(e) => warn!(error = %e, "Dropping chunk"),
        }
    }

    fn finish<F>(&self, close: F, error: Option<String>)
    where
        F: FnOnce(&Conversation) -> Result<Conversation, CoreError>,
    {
        let closed = close(&self.view.borrow().conversation);
        if let Err(e) = &closed {
            warn!(error = %e, "No in-flight message to close");
        }

        self.publish(|view| {
            if let Ok(conversation) = closed {
                view.conversation = conversation;
            }
            view.awaiting = false;
            view.error = error;
        });
    }

    fn publish<F>(&self, update: F)
    where
        F: FnOnce(&mut ChatView),
    {
        self.view.send_modify(update);

        if !self.observers.is_empty() {
            let view = self.view.borrow().clone();
            for observer in &self.observers {
                observer.on_view(&view);
            }
        }
    }
}
