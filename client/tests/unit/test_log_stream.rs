//! Log stream tests against the fake build service

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use buildrun::workers::log_stream::{LogStream, Options};

use crate::common::{FakeBuildService, Reply};

async fn next(stream: &mut LogStream) -> Option<String> {
    tokio::time::timeout(Duration::from_secs(5), stream.next_line())
        .await
        .expect("timed out waiting for a log line")
}

#[tokio::test]
async fn test_lines_arrive_in_order() {
    let service = FakeBuildService::start(
        Reply::json(StatusCode::OK, json!({"urls": []})),
        &["Step 1/2 : FROM alpine", "Heartbeat", "Step 2/2 : CMD sh"],
    )
    .await;

    let mut stream = LogStream::open(
        Options::default(),
        reqwest::Client::new(),
        format!("{}/logs", service.base_url),
    );

    assert_eq!(next(&mut stream).await.as_deref(), Some("Step 1/2 : FROM alpine"));
    assert_eq!(next(&mut stream).await.as_deref(), Some("Heartbeat"));
    assert_eq!(next(&mut stream).await.as_deref(), Some("Step 2/2 : CMD sh"));

    stream.close().await;
    assert!(stream.is_closed());
    assert_eq!(stream.next_line().await, None);

    // second close is a no-op
    stream.close().await;
}

#[tokio::test]
async fn test_unreachable_stream_keeps_retrying_until_closed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut stream = LogStream::open(
        Options::default(),
        reqwest::Client::new(),
        format!("http://{}/api/v1/logs", addr),
    );

    let pending = tokio::time::timeout(Duration::from_millis(200), stream.next_line()).await;
    assert!(pending.is_err());

    tokio::time::timeout(Duration::from_secs(5), stream.close())
        .await
        .unwrap();
}
