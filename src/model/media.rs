//! Media payloads and query parameters sent through the dispatch layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level kind of an uploaded file, taken from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Classifies `image/png` as `Image`, `video/mp4` as `Video`, anything else as `Other`.
    pub fn from_mime(mime: &str) -> Self {
        let top = mime.split('/').next().unwrap_or_default().trim();
        if top.eq_ignore_ascii_case("image") {
            MediaKind::Image
        } else if top.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// What the caller declares about a file before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl MediaDescriptor {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// A file ready for upload: its descriptor plus the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub descriptor: MediaDescriptor,
    pub body: Vec<u8>,
}

impl MediaPayload {
    /// Builds a payload whose declared size is the body length.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, body: Vec<u8>) -> Self {
        let descriptor = MediaDescriptor::new(file_name, mime_type, body.len() as u64);
        Self { descriptor, body }
    }
}

// Bodies can be tens of megabytes; keep them out of debug logs.
impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("descriptor", &self.descriptor)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Analysis model selected for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryModel {
    Restock,
    Stocktaking,
}

impl QueryModel {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryModel::Restock => "Restock",
            QueryModel::Stocktaking => "Stocktaking",
        }
    }
}

impl fmt::Display for QueryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Restock" => Ok(QueryModel::Restock),
            "Stocktaking" => Ok(QueryModel::Stocktaking),
            other => Err(format!(
                "Unsupported model {other}. Please choose from: Restock, Stocktaking"
            )),
        }
    }
}

/// Body returned by the upload and query endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReply {
    #[serde(default = "DispatchReply::ok_code")]
    pub code: u16,
    pub message: String,
}

impl DispatchReply {
    fn ok_code() -> u16 {
        200
    }
}
