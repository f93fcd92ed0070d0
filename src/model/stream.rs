//! Result-stream records and the session they are assembled into.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Format and size details attached to an image result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub format: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// Payload of an `image` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub url: String,
    pub description: String,
    pub metadata: ImageMetadata,
}

/// Payload of a `video` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub url: String,
    pub filename: String,
    pub format: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// A single result delivered over the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Image(ImageRecord),
    Video(VideoRecord),
}

/// Lifecycle status of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Complete,
    Error,
}

impl StreamStatus {
    /// `Complete` and `Error` accept no further events until a restart.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStatus::Complete | StreamStatus::Error)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamStatus::Idle => "idle",
            StreamStatus::Connecting => "connecting",
            StreamStatus::Streaming => "streaming",
            StreamStatus::Complete => "complete",
            StreamStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// The result set being assembled from one stream subscription.
///
/// `items` keeps arrival order; `video` holds the most recently received video only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamSession {
    pub status: StreamStatus,
    pub items: Vec<ImageRecord>,
    pub video: Option<VideoRecord>,
    pub error_message: Option<String>,
    /// Opaque payload of the `connect` event.
    pub session_info: Option<String>,
    /// Opaque payload of the `complete` event.
    pub completion: Option<String>,
}

impl StreamSession {
    /// One-line description of where the session stands, for status banners.
    pub fn summary(&self) -> String {
        match self.status {
            StreamStatus::Idle => "Idle".to_string(),
            StreamStatus::Connecting | StreamStatus::Streaming => {
                format!("Loading results... {} images so far", self.items.len())
            }
            StreamStatus::Complete => format!(
                "Complete! Found {} images and {}",
                self.items.len(),
                if self.video.is_some() { "1 video" } else { "no videos" }
            ),
            StreamStatus::Error => format!(
                "Error: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
