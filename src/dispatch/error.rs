//! Error types for upload and query dispatch.

use thiserror::Error;

/// A payload or query that fails its precondition. Raised before any request is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type {0}. Please upload an image or a video")]
    UnsupportedMediaKind(String),

    #[error("File is {size} bytes, the upload limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("File declares {declared} bytes but carries {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Query text is empty")]
    EmptyQuery,
}

/// Network or backend failure while dispatching.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Backend returned {code}: {message}")]
    Backend { code: u16, message: String },

    #[error("Could not decode backend reply: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DispatchError::Decode(err.to_string())
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
