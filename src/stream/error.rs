//! Error types for the stream consumer.

use crate::model::StreamStatus;
use thiserror::Error;

/// Errors returned by [`StreamConsumer`](super::StreamConsumer) operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StreamError {
    /// A channel is already owned by this consumer.
    #[error("Stream channel already open")]
    AlreadyOpen,

    /// `open` was called on a session that has already left `Idle`.
    #[error("Stream session is {0}, restart it to open a new channel")]
    NotIdle(StreamStatus),

    /// The channel could not be opened or dropped unexpectedly.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// A malformed or unrecognised inbound event. Never fatal to the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Protocol error on `{tag}` event: {reason}")]
pub struct ProtocolError {
    pub tag: String,
    pub reason: String,
}

impl ProtocolError {
    pub fn new(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}
