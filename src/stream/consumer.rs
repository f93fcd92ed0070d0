//! # Stream Consumer
//!
//! [`StreamConsumer`] owns at most one channel and the [`StreamSession`] it feeds.
//! Every inbound event enters through [`StreamConsumer::handle_event`], strictly in
//! delivery order, and is applied against the session state machine:
//!
//! ```text
//! Idle --open--> Connecting --connect--> Streaming --image/video--> Streaming
//! Connecting/Streaming --error or channel failure--> Error
//! Streaming --complete--> Complete
//! Complete/Error --restart--> Connecting
//! ```
//!
//! Reaching `Complete` or `Error` closes the channel, so a terminal state is entered
//! exactly once per session. `restart` and `close` always close before opening.

use super::channel::{ChannelHandle, Connector, Delivery, Envelope, EventSink};
use super::error::{ProtocolError, StreamError};
use super::event::InboundEvent;
use crate::model::{ImageRecord, StreamItem, StreamSession, StreamStatus, VideoRecord};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Prefix of the message recorded when the channel fails underneath the session.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

/// What [`StreamConsumer::handle_event`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The event changed (or confirmed) the session state.
    Applied,
    /// The event arrived when no channel was accepting deliveries.
    Ignored(&'static str),
    /// The event was malformed or out of order and was dropped.
    Dropped(ProtocolError),
}

struct OpenChannel {
    generation: u64,
    endpoint: String,
    handle: ChannelHandle,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

/// Consumes one push channel at a time and assembles its results.
pub struct StreamConsumer {
    connector: Arc<dyn Connector>,
    session: StreamSession,
    channel: Option<OpenChannel>,
    next_generation: u64,
    protocol_errors: u64,
    ignored_events: u64,
}

impl StreamConsumer {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: StreamSession::default(),
            channel: None,
            next_generation: 1,
            protocol_errors: 0,
            ignored_events: 0,
        }
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn status(&self) -> StreamStatus {
        self.session.status
    }

    pub fn items(&self) -> &[ImageRecord] {
        &self.session.items
    }

    pub fn video(&self) -> Option<&VideoRecord> {
        self.session.video.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.session.error_message.as_deref()
    }

    /// Protocol errors dropped in the current session.
    pub fn protocol_errors(&self) -> u64 {
        self.protocol_errors
    }

    /// Events ignored in the current session because no channel was accepting them.
    pub fn ignored_events(&self) -> u64 {
        self.ignored_events
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Endpoint of the owned channel, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.endpoint.as_str())
    }

    /// Opens a channel to `endpoint` and moves the session from `Idle` to `Connecting`.
    ///
    /// # Errors
    /// - [`StreamError::AlreadyOpen`] if a channel is already owned.
    /// - [`StreamError::NotIdle`] if the session has been used; call [`restart`](Self::restart).
    /// - [`StreamError::Connection`] if the connector could not open the channel. The
    ///   session is left in `Error` with the reason recorded.
    pub fn open(&mut self, endpoint: &str) -> Result<(), StreamError> {
        if self.channel.is_some() {
            warn!(endpoint, "Open rejected, channel already owned");
            return Err(StreamError::AlreadyOpen);
        }
        if self.session.status != StreamStatus::Idle {
            warn!(endpoint, status = %self.session.status, "Open rejected, session not idle");
            return Err(StreamError::NotIdle(self.session.status));
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let (sender, receiver) = mpsc::unbounded_channel();
        let sink = EventSink::new(generation, sender);

        self.transition(StreamStatus::Connecting);
        match self.connector.connect(endpoint, sink) {
            Ok(handle) => {
                info!(endpoint, generation, "Channel opened");
                self.channel = Some(OpenChannel {
                    generation,
                    endpoint: endpoint.to_string(),
                    handle,
                    receiver,
                });
                Ok(())
            }
            Err(e) => {
                warn!(endpoint, error = %e, "Channel failed to open");
                self.session.error_message = Some(e.to_string());
                self.transition(StreamStatus::Error);
                Err(e)
            }
        }
    }

    /// Closes any owned channel, starts a fresh session and opens `endpoint`.
    pub fn restart(&mut self, endpoint: &str) -> Result<(), StreamError> {
        info!(endpoint, from = %self.session.status, "Restarting stream session");
        self.close();
        self.session = StreamSession::default();
        self.protocol_errors = 0;
        self.ignored_events = 0;
        self.open(endpoint)
    }

    /// Closes the owned channel, if any. Safe to call from any state, any number of times.
    ///
    /// After this returns, no further events are accepted until a new channel opens.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.handle.close();
            channel.receiver.close();
            info!(
                endpoint = %channel.endpoint,
                generation = channel.generation,
                "Channel closed"
            );
        }
    }

    /// Applies one inbound event to the session.
    ///
    /// Only events arriving while a channel is owned are considered. Malformed or
    /// unknown events are dropped and counted; they never end the session.
    pub fn handle_event(&mut self, tag: &str, payload: &str) -> Disposition {
        if self.channel.is_none() {
            self.ignored_events += 1;
            warn!(tag, status = %self.session.status, "Event ignored, no open channel");
            return Disposition::Ignored("no open channel");
        }

        let event = match InboundEvent::parse(tag, payload) {
            Ok(event) => event,
            Err(e) => return self.drop_event(e),
        };

        match event {
            InboundEvent::Connect(info) => match self.session.status {
                StreamStatus::Connecting => {
                    self.session.session_info = Some(info);
                    self.transition(StreamStatus::Streaming);
                    Disposition::Applied
                }
                StreamStatus::Streaming => {
                    debug!("Duplicate connect event");
                    Disposition::Applied
                }
                status => self.drop_event(ProtocolError::new(
                    tag,
                    format!("received while {status}"),
                )),
            },
            InboundEvent::Item(item) => {
                if self.session.status != StreamStatus::Streaming {
                    let status = self.session.status;
                    return self
                        .drop_event(ProtocolError::new(tag, format!("received while {status}")));
                }
                match item {
                    StreamItem::Image(image) => {
                        debug!(url = %image.url, "Image received");
                        self.session.items.push(image);
                    }
                    StreamItem::Video(video) => {
                        debug!(url = %video.url, replaced = self.session.video.is_some(), "Video received");
                        self.session.video = Some(video);
                    }
                }
                Disposition::Applied
            }
            InboundEvent::Error(message) => {
                warn!(%message, "Stream reported an error");
                self.session.error_message = Some(message);
                self.transition(StreamStatus::Error);
                self.close();
                Disposition::Applied
            }
            InboundEvent::Complete(summary) => {
                if self.session.status != StreamStatus::Streaming {
                    let status = self.session.status;
                    return self
                        .drop_event(ProtocolError::new(tag, format!("received while {status}")));
                }
                self.session.completion = Some(summary);
                self.transition(StreamStatus::Complete);
                info!(
                    images = self.session.items.len(),
                    video = self.session.video.is_some(),
                    "Stream complete"
                );
                self.close();
                Disposition::Applied
            }
        }
    }

    /// Waits for the next delivery on the owned channel and applies it.
    ///
    /// Returns `None` when there is no channel to wait on.
    pub async fn next_delivery(&mut self) -> Option<Disposition> {
        let (generation, envelope) = {
            let channel = self.channel.as_mut()?;
            (channel.generation, channel.receiver.recv().await)
        };

        let disposition = match envelope {
            None => self.fail_channel("channel closed unexpectedly"),
            Some(envelope) if envelope.generation != generation => {
                self.ignored_events += 1;
                warn!(
                    stale = envelope.generation,
                    current = generation,
                    "Stale delivery discarded"
                );
                Disposition::Ignored("stale delivery")
            }
            Some(Envelope {
                delivery: Delivery::Event { tag, payload },
                ..
            }) => self.handle_event(&tag, &payload),
            Some(Envelope {
                delivery: Delivery::Failure(detail),
                ..
            }) => self.fail_channel(&detail),
        };
        Some(disposition)
    }

    /// Applies deliveries until the session reaches a terminal state or loses its channel.
    pub async fn run_until_terminal(&mut self) -> StreamStatus {
        while self.next_delivery().await.is_some() {}
        self.session.status
    }

    fn fail_channel(&mut self, detail: &str) -> Disposition {
        let message = format!("{CONNECTION_ERROR_MESSAGE} ({detail})");
        warn!(%message, status = %self.session.status, "Channel failed");
        self.session.error_message = Some(message);
        self.transition(StreamStatus::Error);
        self.close();
        Disposition::Applied
    }

    fn drop_event(&mut self, error: ProtocolError) -> Disposition {
        self.protocol_errors += 1;
        warn!(error = %error, dropped = self.protocol_errors, "Event dropped");
        Disposition::Dropped(error)
    }

    fn transition(&mut self, to: StreamStatus) {
        let from = self.session.status;
        if from != to {
            info!(%from, %to, "Stream status changed");
            self.session.status = to;
        }
    }
}

impl std::fmt::Debug for StreamConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConsumer")
            .field("status", &self.session.status)
            .field("items", &self.session.items.len())
            .field("endpoint", &self.endpoint())
            .field("protocol_errors", &self.protocol_errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryConnector;

    const ENDPOINT: &str = "http://127.0.0.1:5000/api/v1/result";

    fn image(name: &str) -> (String, ImageRecord) {
        let record = ImageRecord {
            url: format!("http://cdn/{name}.png"),
            description: format!("shelf {name}"),
            metadata: crate::model::ImageMetadata {
                format: "png".into(),
                size_bytes: 1024,
            },
        };
        (serde_json::to_string(&record).unwrap(), record)
    }

    fn video(name: &str) -> (String, VideoRecord) {
        let record = VideoRecord {
            url: format!("http://cdn/{name}.mp4"),
            filename: format!("{name}.mp4"),
            format: "mp4".into(),
            size_bytes: 4096,
        };
        (serde_json::to_string(&record).unwrap(), record)
    }

    fn open_consumer() -> (StreamConsumer, MemoryConnector) {
        let connector = MemoryConnector::new();
        let mut consumer = StreamConsumer::new(Arc::new(connector.clone()));
        consumer.open(ENDPOINT).unwrap();
        (consumer, connector)
    }

    #[test]
    fn images_then_complete() {
        let (mut consumer, connector) = open_consumer();
        let (a_json, a) = image("A");
        let (b_json, b) = image("B");

        assert_eq!(consumer.handle_event("connect", "session-1"), Disposition::Applied);
        assert_eq!(consumer.handle_event("image", &a_json), Disposition::Applied);
        assert_eq!(consumer.handle_event("image", &b_json), Disposition::Applied);
        assert_eq!(consumer.handle_event("complete", "2 images"), Disposition::Applied);

        assert_eq!(consumer.items(), &[a, b]);
        assert!(consumer.video().is_none());
        assert_eq!(consumer.status(), StreamStatus::Complete);
        assert!(!consumer.is_open());
        assert_eq!(connector.live_channels(), 0);
    }

    #[test]
    fn error_event_keeps_received_items() {
        let (mut consumer, _connector) = open_consumer();
        let (a_json, a) = image("A");

        consumer.handle_event("connect", "");
        consumer.handle_event("image", &a_json);
        consumer.handle_event("error", "x");

        assert_eq!(consumer.items(), &[a]);
        assert_eq!(consumer.status(), StreamStatus::Error);
        assert_eq!(consumer.error_message(), Some("x"));
        assert!(!consumer.is_open());
    }

    #[test]
    fn last_video_wins() {
        let (mut consumer, _connector) = open_consumer();
        let (v1_json, _) = video("V1");
        let (v2_json, v2) = video("V2");

        consumer.handle_event("connect", "");
        consumer.handle_event("video", &v1_json);
        consumer.handle_event("video", &v2_json);

        assert_eq!(consumer.video(), Some(&v2));
        assert_eq!(consumer.status(), StreamStatus::Streaming);
    }

    #[test]
    fn restart_after_complete_starts_fresh() {
        let (mut consumer, connector) = open_consumer();
        let (a_json, _) = image("A");
        let (v_json, _) = video("V");
        consumer.handle_event("connect", "");
        consumer.handle_event("image", &a_json);
        consumer.handle_event("video", &v_json);
        consumer.handle_event("complete", "");

        consumer.restart(ENDPOINT).unwrap();

        assert_eq!(consumer.status(), StreamStatus::Connecting);
        assert!(consumer.items().is_empty());
        assert!(consumer.video().is_none());
        assert_eq!(connector.endpoints().len(), 2);
        assert_eq!(connector.live_channels(), 1);
    }

    #[test]
    fn restart_mid_stream_closes_previous_channel() {
        let (mut consumer, connector) = open_consumer();
        consumer.handle_event("connect", "");
        let first_sink = connector.latest_sink().unwrap();

        consumer.restart(ENDPOINT).unwrap();

        assert!(first_sink.is_closed());
        assert_eq!(connector.live_channels(), 1);
    }

    #[test]
    fn second_open_is_rejected() {
        let (mut consumer, connector) = open_consumer();
        assert_eq!(consumer.open(ENDPOINT), Err(StreamError::AlreadyOpen));
        assert_eq!(connector.endpoints().len(), 1);
    }

    #[test]
    fn open_after_terminal_requires_restart() {
        let (mut consumer, _connector) = open_consumer();
        consumer.handle_event("connect", "");
        consumer.handle_event("complete", "");

        assert_eq!(
            consumer.open(ENDPOINT),
            Err(StreamError::NotIdle(StreamStatus::Complete))
        );
    }

    #[test]
    fn events_after_terminal_are_ignored() {
        let (mut consumer, _connector) = open_consumer();
        let (a_json, _) = image("A");
        consumer.handle_event("connect", "");
        consumer.handle_event("complete", "");

        assert_eq!(
            consumer.handle_event("image", &a_json),
            Disposition::Ignored("no open channel")
        );
        assert_eq!(
            consumer.handle_event("error", "late"),
            Disposition::Ignored("no open channel")
        );
        assert!(consumer.items().is_empty());
        assert_eq!(consumer.status(), StreamStatus::Complete);
        assert_eq!(consumer.ignored_events(), 2);
    }

    #[test]
    fn unknown_and_malformed_events_are_counted_not_fatal() {
        let (mut consumer, _connector) = open_consumer();
        let (a_json, a) = image("A");
        consumer.handle_event("connect", "");

        assert!(matches!(
            consumer.handle_event("heartbeat", "{}"),
            Disposition::Dropped(_)
        ));
        assert!(matches!(
            consumer.handle_event("image", "{\"url\":"),
            Disposition::Dropped(_)
        ));
        consumer.handle_event("image", &a_json);

        assert_eq!(consumer.protocol_errors(), 2);
        assert_eq!(consumer.items(), &[a]);
        assert_eq!(consumer.status(), StreamStatus::Streaming);
    }

    #[test]
    fn items_before_connect_are_out_of_order() {
        let (mut consumer, _connector) = open_consumer();
        let (a_json, _) = image("A");

        assert!(matches!(
            consumer.handle_event("image", &a_json),
            Disposition::Dropped(_)
        ));
        assert!(matches!(
            consumer.handle_event("complete", ""),
            Disposition::Dropped(_)
        ));
        assert_eq!(consumer.status(), StreamStatus::Connecting);
        assert_eq!(consumer.protocol_errors(), 2);
    }

    #[test]
    fn duplicate_connect_is_a_no_op() {
        let (mut consumer, _connector) = open_consumer();
        consumer.handle_event("connect", "first");
        assert_eq!(consumer.handle_event("connect", "second"), Disposition::Applied);
        assert_eq!(consumer.status(), StreamStatus::Streaming);
        assert_eq!(consumer.session().session_info.as_deref(), Some("first"));
    }

    #[test]
    fn error_while_connecting_is_terminal() {
        let (mut consumer, _connector) = open_consumer();
        consumer.handle_event("error", "");
        assert_eq!(consumer.status(), StreamStatus::Error);
        assert_eq!(
            consumer.error_message(),
            Some(crate::stream::DEFAULT_ERROR_MESSAGE)
        );
    }

    #[test]
    fn close_is_idempotent_from_any_state() {
        let connector = MemoryConnector::new();
        let mut consumer = StreamConsumer::new(Arc::new(connector.clone()));
        consumer.close();
        consumer.close();
        assert_eq!(consumer.status(), StreamStatus::Idle);

        consumer.open(ENDPOINT).unwrap();
        consumer.close();
        consumer.close();
        assert!(!consumer.is_open());
        assert_eq!(
            consumer.handle_event("connect", ""),
            Disposition::Ignored("no open channel")
        );
    }

    #[test]
    fn refused_connection_enters_error() {
        let mut consumer = StreamConsumer::new(Arc::new(MemoryConnector::refusing("refused")));
        let result = consumer.open(ENDPOINT);

        assert_eq!(result, Err(StreamError::Connection("refused".into())));
        assert_eq!(consumer.status(), StreamStatus::Error);
        assert_eq!(consumer.error_message(), Some("Connection error: refused"));
        assert!(!consumer.is_open());
    }

    #[tokio::test]
    async fn deliveries_are_applied_in_order() {
        let (mut consumer, connector) = open_consumer();
        let sink = connector.latest_sink().unwrap();
        let (a_json, a) = image("A");
        let (b_json, b) = image("B");

        sink.event("connect", "s");
        sink.event("image", a_json);
        sink.event("image", b_json);
        sink.event("complete", "done");
        sink.event("image", "never applied");

        assert_eq!(consumer.run_until_terminal().await, StreamStatus::Complete);
        assert_eq!(consumer.items(), &[a, b]);
        assert_eq!(consumer.session().completion.as_deref(), Some("done"));
        assert!(consumer.next_delivery().await.is_none());
    }

    #[tokio::test]
    async fn transport_failure_enters_error() {
        let (mut consumer, connector) = open_consumer();
        let sink = connector.latest_sink().unwrap();

        sink.event("connect", "s");
        sink.failure("connection reset");

        assert_eq!(consumer.run_until_terminal().await, StreamStatus::Error);
        let message = consumer.error_message().unwrap();
        assert!(message.starts_with(CONNECTION_ERROR_MESSAGE));
        assert!(message.contains("connection reset"));
        assert!(sink.is_closed());
    }
}
