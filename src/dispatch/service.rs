//! Validation in front of a [`Dispatcher`].

use super::client::Dispatcher;
use super::error::{QueryError, UploadError};
use super::validate::{validate_payload, validate_query, MAX_UPLOAD_BYTES};
use crate::model::{DispatchReply, MediaPayload, QueryModel};
use tracing::{info, instrument, warn};

/// Checks every payload and query before it reaches the dispatcher. A rejected input
/// never produces a dispatcher call.
#[derive(Debug, Clone)]
pub struct DispatchService<D> {
    dispatcher: D,
    max_upload_bytes: u64,
}

impl<D: Dispatcher> DispatchService<D> {
    pub fn new(dispatcher: D) -> Self {
        Self::with_limit(dispatcher, MAX_UPLOAD_BYTES)
    }

    pub fn with_limit(dispatcher: D, max_upload_bytes: u64) -> Self {
        Self {
            dispatcher,
            max_upload_bytes,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    #[instrument(skip(self, payload), fields(file = %payload.descriptor.file_name))]
    pub async fn upload(&self, payload: MediaPayload) -> Result<DispatchReply, UploadError> {
        let kind = validate_payload(&payload, self.max_upload_bytes)
            .inspect_err(|e| warn!(error = %e, "Upload rejected"))?;
        let reply = self.dispatcher.dispatch_upload(payload).await?;
        info!(?kind, message = %reply.message, "Upload accepted");
        Ok(reply)
    }

    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, model: QueryModel) -> Result<DispatchReply, QueryError> {
        let text = validate_query(text)?;
        let reply = self.dispatcher.dispatch_query(text, model).await?;
        info!(%model, "Query answered");
        Ok(reply)
    }
}
