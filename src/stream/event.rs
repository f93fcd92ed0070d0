//! Decoding of tagged channel events.

use super::error::ProtocolError;
use crate::model::{ImageRecord, StreamItem, VideoRecord};

/// Message used when the server reports an error without a body.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred while fetching results";

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Connect(String),
    Item(StreamItem),
    Error(String),
    Complete(String),
}

impl InboundEvent {
    /// Decodes a `(tag, payload)` pair as delivered by the channel.
    ///
    /// `image` and `video` payloads are JSON records; the others are opaque text.
    pub fn parse(tag: &str, payload: &str) -> Result<Self, ProtocolError> {
        match tag {
            "connect" => Ok(InboundEvent::Connect(payload.to_string())),
            "image" => serde_json::from_str::<ImageRecord>(payload)
                .map(|image| InboundEvent::Item(StreamItem::Image(image)))
                .map_err(|e| ProtocolError::new(tag, format!("malformed payload: {e}"))),
            "video" => serde_json::from_str::<VideoRecord>(payload)
                .map(|video| InboundEvent::Item(StreamItem::Video(video)))
                .map_err(|e| ProtocolError::new(tag, format!("malformed payload: {e}"))),
            "error" => {
                let message = if payload.trim().is_empty() {
                    DEFAULT_ERROR_MESSAGE.to_string()
                } else {
                    payload.to_string()
                };
                Ok(InboundEvent::Error(message))
            }
            "complete" => Ok(InboundEvent::Complete(payload.to_string())),
            other => Err(ProtocolError::new(other, "unrecognised event tag")),
        }
    }
}
