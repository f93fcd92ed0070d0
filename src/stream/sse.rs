//! HTTP event-stream transport.
//!
//! [`SseConnector`] subscribes with `reqwest-eventsource` and forwards each message
//! into the channel sink as a `(tag, payload)` pair. The first transport error ends
//! the channel: the event source is closed instead of being left to reconnect.

use super::channel::{ChannelHandle, Connector, EventSink};
use super::error::StreamError;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest_eventsource::{Event, EventSource};
use tracing::{debug, info, warn};

/// Detail reported when the server ends the stream without `complete` or `error`.
pub const STREAM_ENDED: &str = "event stream ended without a terminal event";

/// Opens channels over HTTP server-sent events.
#[derive(Debug, Clone, Default)]
pub struct SseConnector {
    client: reqwest::Client,
}

impl SseConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for SseConnector {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<ChannelHandle, StreamError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StreamError::Connection(format!("no async runtime: {e}")))?;
        let request = self.client.get(endpoint).header(ACCEPT, "text/event-stream");
        let mut source =
            EventSource::new(request).map_err(|e| StreamError::Connection(e.to_string()))?;

        let endpoint = endpoint.to_string();
        let generation = sink.generation();
        let task = runtime.spawn(async move {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => info!(%endpoint, generation, "Event stream connected"),
                    Ok(Event::Message(message)) => {
                        debug!(generation, tag = %message.event, "Event received");
                        if !sink.event(message.event, message.data) {
                            debug!(generation, "Channel closed by consumer");
                            source.close();
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(%endpoint, generation, error = %e, "Event stream failed");
                        source.close();
                        let _ = sink.failure(e.to_string());
                        return;
                    }
                }
            }
            let _ = sink.failure(STREAM_ENDED);
        });

        Ok(ChannelHandle::from_task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    /// Address of a loopback port that was just released, so nothing is listening.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[test]
    fn connect_outside_runtime_is_a_connection_error() {
        let (sender, _receiver) = mpsc::unbounded_channel();
        let endpoint = format!("{}/stream", closed_port_url());
        let result = SseConnector::default().connect(&endpoint, EventSink::new(1, sender));
        assert!(matches!(result, Err(StreamError::Connection(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_failure() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let endpoint = format!("{}/stream", closed_port_url());
        let _handle = SseConnector::default()
            .connect(&endpoint, EventSink::new(3, sender))
            .unwrap();

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.generation, 3);
        assert!(matches!(envelope.delivery, crate::stream::Delivery::Failure(_)));
    }
}
