//! Preconditions checked before anything is handed to a [`Dispatcher`](super::Dispatcher).

use super::error::ValidationError;
use crate::model::{MediaDescriptor, MediaKind, MediaPayload};

/// Largest accepted upload, 50 MiB. A file of exactly this size is accepted.
pub const MAX_UPLOAD_BYTES: u64 = 52_428_800;

/// Accepts images and videos no larger than `limit` bytes and returns their kind.
///
/// The kind is checked first, so a non-media file is rejected whatever its size.
pub fn validate_upload(
    descriptor: &MediaDescriptor,
    limit: u64,
) -> Result<MediaKind, ValidationError> {
    let kind = descriptor.kind();
    if kind == MediaKind::Other {
        return Err(ValidationError::UnsupportedMediaKind(
            descriptor.mime_type.clone(),
        ));
    }
    if descriptor.size_bytes > limit {
        return Err(ValidationError::TooLarge {
            size: descriptor.size_bytes,
            limit,
        });
    }
    Ok(kind)
}

/// Checks a payload ready to send: its body must be exactly the declared size, and the
/// descriptor must pass [`validate_upload`].
pub fn validate_payload(payload: &MediaPayload, limit: u64) -> Result<MediaKind, ValidationError> {
    let actual = payload.body.len() as u64;
    if actual != payload.descriptor.size_bytes {
        return Err(ValidationError::SizeMismatch {
            declared: payload.descriptor.size_bytes,
            actual,
        });
    }
    validate_upload(&payload.descriptor, limit)
}

/// Returns the trimmed query text, rejecting blank input.
pub fn validate_query(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyQuery)
    } else {
        Ok(trimmed)
    }
}
