//! # Channel Seam
//!
//! A channel is a one-way, server-to-client push transport. The consumer never talks
//! to a transport directly: it asks a [`Connector`] to open one and hands it an
//! [`EventSink`]. The transport pushes tagged events into the sink; the consumer owns
//! the receiving end and the [`ChannelHandle`] that tears the transport down.
//!
//! Every channel gets its own sink/receiver pair and a generation number. Closing a
//! channel aborts the transport task and drops the receiver, so anything still in
//! flight is discarded rather than delivered late.

use super::error::StreamError;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What a transport can push into a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A tagged event with its raw payload.
    Event { tag: String, payload: String },
    /// The transport failed or ended; carries the detail.
    Failure(String),
}

/// A delivery stamped with the generation of the channel that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub generation: u64,
    pub delivery: Delivery,
}

/// Sending half given to a transport when a channel opens.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    sender: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    pub fn new(generation: u64, sender: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { generation, sender }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pushes a tagged event. Returns `false` once the channel has been closed.
    pub fn event(&self, tag: impl Into<String>, payload: impl Into<String>) -> bool {
        self.push(Delivery::Event {
            tag: tag.into(),
            payload: payload.into(),
        })
    }

    /// Reports a transport failure. Returns `false` once the channel has been closed.
    pub fn failure(&self, detail: impl Into<String>) -> bool {
        self.push(Delivery::Failure(detail.into()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn push(&self, delivery: Delivery) -> bool {
        self.sender
            .send(Envelope {
                generation: self.generation,
                delivery,
            })
            .is_ok()
    }
}

/// Owns the transport side of an open channel.
///
/// Dropping the handle closes the channel.
#[derive(Debug, Default)]
pub struct ChannelHandle {
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    /// A handle with no background task, for transports driven from outside.
    pub fn detached() -> Self {
        Self { task: None }
    }

    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Aborts the transport task. Idempotent.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens channels to an endpoint.
pub trait Connector: Send + Sync {
    /// Starts delivering events for `endpoint` into `sink`.
    ///
    /// An `Err` means the channel never opened; the consumer moves to `Error`.
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<ChannelHandle, StreamError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    connections: Vec<(String, EventSink)>,
    refusal: Option<String>,
}

/// A connector with no network behind it.
///
/// It records every connection and keeps the sink so the owner can push events by
/// hand. Used by tests and by embedders that bridge events from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose every `connect` fails with `reason`.
    pub fn refusing(reason: impl Into<String>) -> Self {
        let connector = Self::default();
        connector.lock().refusal = Some(reason.into());
        connector
    }

    /// Sink of the most recently opened channel.
    pub fn latest_sink(&self) -> Option<EventSink> {
        self.lock().connections.last().map(|(_, sink)| sink.clone())
    }

    /// Endpoints connected to so far, oldest first.
    pub fn endpoints(&self) -> Vec<String> {
        self.lock()
            .connections
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    /// Number of channels opened through this connector that are still open.
    pub fn live_channels(&self) -> usize {
        self.lock()
            .connections
            .iter()
            .filter(|(_, sink)| !sink.is_closed())
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<ChannelHandle, StreamError> {
        let mut state = self.lock();
        if let Some(reason) = &state.refusal {
            return Err(StreamError::Connection(reason.clone()));
        }
        state.connections.push((endpoint.to_string(), sink));
        Ok(ChannelHandle::detached())
    }
}
