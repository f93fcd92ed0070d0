//! # Dispatch Client
//!
//! [`Dispatcher`] is the seam between validated input and the analysis backend.
//! [`HttpDispatcher`] is the production implementation; tests substitute a recording
//! dispatcher so no network is involved.
//!
//! Both dispatch endpoints answer `{code, message}`. A non-2xx status or a `code`
//! other than 200 is reported as [`DispatchError::Backend`].

use super::error::DispatchError;
use crate::model::{
    sort_event_log, DispatchReply, EventLogEntry, InventoryListingItem, MediaPayload, QueryModel,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const OK_CODE: u16 = 200;

/// Sends validated uploads and queries to the backend. One request, one reply, no state.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch_upload(&self, payload: MediaPayload) -> Result<DispatchReply, DispatchError>;

    async fn dispatch_query(
        &self,
        text: &str,
        model: QueryModel,
    ) -> Result<DispatchReply, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDispatcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/inventory`.
    #[instrument(skip(self))]
    pub async fn fetch_inventory(&self) -> Result<Vec<InventoryListingItem>, DispatchError> {
        self.get_json("/api/inventory").await
    }

    /// `GET /api/events`, newest entry first.
    #[instrument(skip(self))]
    pub async fn fetch_events(&self) -> Result<Vec<EventLogEntry>, DispatchError> {
        let mut entries: Vec<EventLogEntry> = self.get_json("/api/events").await?;
        sort_event_log(&mut entries);
        Ok(entries)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DispatchError> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(DispatchError::from);
        }
        let body = response.bytes().await?;
        Err(DispatchError::Backend {
            code: status.as_u16(),
            message: failure_message(status, &body),
        })
    }

    async fn read_reply(response: reqwest::Response) -> Result<DispatchReply, DispatchError> {
        let status = response.status();
        let body = response.bytes().await?;
        interpret_reply(status, &body)
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    #[instrument(skip(self, payload), fields(file = %payload.descriptor.file_name))]
    async fn dispatch_upload(&self, payload: MediaPayload) -> Result<DispatchReply, DispatchError> {
        let MediaPayload { descriptor, body } = payload;
        debug!(size = descriptor.size_bytes, mime = %descriptor.mime_type, "Uploading");
        let part = Part::bytes(body)
            .file_name(descriptor.file_name)
            .mime_str(&descriptor.mime_type)?;
        let form = Form::new().part("files", part);

        let response = self
            .http
            .post(self.endpoint("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::read_reply(response).await
    }

    #[instrument(skip(self))]
    async fn dispatch_query(
        &self,
        text: &str,
        model: QueryModel,
    ) -> Result<DispatchReply, DispatchError> {
        let response = self
            .http
            .post(self.endpoint("/api/query"))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("query", text), ("model", model.as_str())])
            .send()
            .await?;
        Self::read_reply(response).await
    }
}

/// Maps an HTTP status and body onto a reply or a backend error.
pub(crate) fn interpret_reply(status: StatusCode, body: &[u8]) -> Result<DispatchReply, DispatchError> {
    if !status.is_success() {
        let message = failure_message(status, body);
        warn!(status = status.as_u16(), %message, "Backend rejected request");
        return Err(DispatchError::Backend {
            code: status.as_u16(),
            message,
        });
    }

    let reply: DispatchReply =
        serde_json::from_slice(body).map_err(|e| DispatchError::Decode(e.to_string()))?;
    if reply.code != OK_CODE {
        warn!(code = reply.code, message = %reply.message, "Backend reported failure");
        return Err(DispatchError::Backend {
            code: reply.code,
            message: reply.message,
        });
    }
    Ok(reply)
}

fn failure_message(status: StatusCode, body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
