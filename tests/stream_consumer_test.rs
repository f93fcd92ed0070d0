use shelfwatch::model::StreamStatus;
use shelfwatch::stream::{
    Disposition, MemoryConnector, StreamConsumer, StreamError, CONNECTION_ERROR_MESSAGE,
};
use std::sync::Arc;

const ENDPOINT: &str = "http://127.0.0.1:5000/api/v1/result";

fn image(n: u32) -> String {
    format!(
        r#"{{"url":"https://cdn.example/shelf-{n}.png","description":"Aisle {n}","metadata":{{"format":"png","size":2048}}}}"#
    )
}

const VIDEO: &str =
    r#"{"url":"https://cdn.example/aisle.mp4","filename":"aisle.mp4","format":"mp4","size":1048576}"#;

fn consumer() -> (StreamConsumer, MemoryConnector) {
    let connector = MemoryConnector::new();
    (StreamConsumer::new(Arc::new(connector.clone())), connector)
}

#[tokio::test]
async fn full_session_runs_to_complete() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    assert_eq!(consumer.status(), StreamStatus::Connecting);
    assert_eq!(connector.endpoints(), [ENDPOINT]);

    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "session 42");
    sink.event("image", image(1));
    sink.event("image", image(2));
    sink.event("video", VIDEO);
    sink.event("complete", "3 results");

    assert_eq!(consumer.run_until_terminal().await, StreamStatus::Complete);

    let urls: Vec<_> = consumer.items().iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://cdn.example/shelf-1.png",
            "https://cdn.example/shelf-2.png"
        ]
    );
    assert_eq!(consumer.items()[0].metadata.size_bytes, 2048);
    assert_eq!(consumer.video().unwrap().size_bytes, 1_048_576);
    assert_eq!(
        consumer.session().summary(),
        "Complete! Found 2 images and 1 video"
    );
    assert!(!consumer.is_open());
    assert_eq!(connector.live_channels(), 0);
}

#[tokio::test]
async fn events_after_complete_are_ignored() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "");
    sink.event("complete", "");
    consumer.run_until_terminal().await;

    assert_eq!(
        consumer.handle_event("image", &image(9)),
        Disposition::Ignored("no open channel")
    );
    assert_eq!(
        consumer.handle_event("error", "late"),
        Disposition::Ignored("no open channel")
    );
    assert_eq!(consumer.status(), StreamStatus::Complete);
    assert!(consumer.items().is_empty());
    assert_eq!(consumer.error_message(), None);
}

#[tokio::test]
async fn malformed_events_are_dropped_not_fatal() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "");
    sink.event("image", "{not json");
    sink.event("thumbnail", "{}");
    sink.event("image", image(1));
    sink.event("complete", "");

    assert_eq!(consumer.run_until_terminal().await, StreamStatus::Complete);
    assert_eq!(consumer.items().len(), 1);
    assert_eq!(consumer.protocol_errors(), 2);
}

#[tokio::test]
async fn server_error_ends_session_with_message() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "");
    sink.event("image", image(1));
    sink.event("error", "Model unavailable");
    sink.event("image", image(2));

    assert_eq!(consumer.run_until_terminal().await, StreamStatus::Error);
    assert_eq!(consumer.error_message(), Some("Model unavailable"));
    assert_eq!(consumer.items().len(), 1);
}

#[tokio::test]
async fn transport_failure_becomes_connection_error() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "");
    sink.failure("connection reset");

    assert_eq!(consumer.run_until_terminal().await, StreamStatus::Error);
    let message = consumer.error_message().unwrap();
    assert!(message.starts_with(CONNECTION_ERROR_MESSAGE));
    assert!(message.contains("connection reset"));
}

#[tokio::test]
async fn second_open_needs_restart() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    assert_eq!(consumer.open(ENDPOINT), Err(StreamError::AlreadyOpen));

    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "");
    sink.event("error", "");
    consumer.run_until_terminal().await;
    assert_eq!(
        consumer.open(ENDPOINT),
        Err(StreamError::NotIdle(StreamStatus::Error))
    );

    consumer.restart(ENDPOINT).unwrap();
    assert_eq!(consumer.status(), StreamStatus::Connecting);
    assert_eq!(consumer.error_message(), None);
    assert_eq!(connector.endpoints().len(), 2);
}

#[tokio::test]
async fn restart_discards_old_channel_deliveries() {
    let (mut consumer, connector) = consumer();
    consumer.open(ENDPOINT).unwrap();
    let old_sink = connector.latest_sink().unwrap();
    old_sink.event("connect", "");

    consumer.restart(ENDPOINT).unwrap();
    assert!(!old_sink.event("image", image(1)));

    let sink = connector.latest_sink().unwrap();
    sink.event("connect", "fresh");
    sink.event("complete", "");

    assert_eq!(consumer.run_until_terminal().await, StreamStatus::Complete);
    assert!(consumer.items().is_empty());
    assert_eq!(consumer.session().session_info.as_deref(), Some("fresh"));
    assert_eq!(connector.live_channels(), 0);
}

#[tokio::test]
async fn refused_connection_leaves_error_state() {
    let connector = MemoryConnector::refusing("no route to host");
    let mut consumer = StreamConsumer::new(Arc::new(connector));

    assert!(matches!(
        consumer.open(ENDPOINT),
        Err(StreamError::Connection(_))
    ));
    assert_eq!(consumer.status(), StreamStatus::Error);
    assert!(!consumer.is_open());
    assert_eq!(consumer.next_delivery().await, None);
}
