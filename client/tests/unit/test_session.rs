//! Session lifecycle tests

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::mpsc;

use buildrun::app::options::BackendOptions;
use buildrun::app::run::Session;
use buildrun::app::state::SubmissionOutcome;
use buildrun::http::client::{BuildClient, SubmitError};
use buildrun::remediation::FALLBACK_SOLUTION;
use buildrun::render::markup::{Block, Span};
use buildrun::render::render;
use buildrun::workers::log_stream::{self, LogStream};

use crate::common::{
    build_request, wait_for_lines, CannedProvider, FakeBuildService, Reply, Scripted,
    ScriptedService,
};

const SHUTDOWN_DELAY: Duration = Duration::from_secs(5);

fn scripted_session(
    replies: Vec<Scripted>,
    provider: Arc<CannedProvider>,
) -> (Session, mpsc::Sender<String>) {
    let (tx, rx) = mpsc::channel(64);
    let session = Session::with_parts(
        Arc::new(ScriptedService::new(replies)),
        provider,
        LogStream::from_receiver(rx),
        SHUTDOWN_DELAY,
    );
    (session, tx)
}

fn no_answers() -> Arc<CannedProvider> {
    Arc::new(CannedProvider::new(vec![]))
}

#[tokio::test]
async fn test_session_over_http_filters_heartbeats() {
    let service = FakeBuildService::start(
        Reply::json(StatusCode::OK, json!({"urls": ["http://localhost:8080"]})),
        &["Step 1/2 : FROM alpine", "Heartbeat", "Step 2/2 : CMD sh"],
    )
    .await;

    let client = BuildClient::new(&BackendOptions {
        base_url: service.base_url.clone(),
        ..Default::default()
    })
    .unwrap();
    let stream = LogStream::open(
        log_stream::Options::default(),
        client.stream_client(),
        client.logs_url(),
    );
    let session = Session::with_parts(Arc::new(client), no_answers(), stream, SHUTDOWN_DELAY);

    let logs = session.logs();
    let lines = wait_for_lines(&logs, 2).await;
    assert_eq!(lines, vec!["Step 1/2 : FROM alpine", "Step 2/2 : CMD sh"]);

    let outcome = session.submit(build_request()).await;
    assert_eq!(
        outcome,
        Some(SubmissionOutcome::Succeeded(vec![Some("http://localhost:8080".to_string())]))
    );

    let view = render(&session.snapshot().await);
    assert_eq!(view.success.unwrap().links[0].url, "http://localhost:8080");
    assert!(view.logs.is_some());
    assert!(view.error.is_none());

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_new_submission_resets_logs_and_error() {
    let (session, tx) = scripted_session(
        vec![
            Scripted::Fail(SubmitError::Server("Build failed".to_string())),
            Scripted::Urls(vec![Some("http://localhost:8080".to_string())]),
        ],
        no_answers(),
    );
    let logs = session.logs();

    let outcome = session.submit(build_request()).await;
    assert_eq!(
        outcome,
        Some(SubmissionOutcome::Failed(SubmitError::Server("Build failed".to_string())))
    );
    tx.send("first attempt".to_string()).await.unwrap();
    assert_eq!(wait_for_lines(&logs, 1).await, vec!["first attempt"]);
    assert_eq!(session.snapshot().await.error().as_deref(), Some("Build failed"));

    let outcome = session.submit(build_request()).await.unwrap();
    assert!(outcome.is_success());
    assert!(logs.is_empty().await);

    tx.send("second attempt".to_string()).await.unwrap();
    assert_eq!(wait_for_lines(&logs, 1).await, vec!["second attempt"]);

    let snapshot = session.snapshot().await;
    assert!(snapshot.error().is_none());
    assert!(!snapshot.submitting);

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_new_submission_supersedes_in_flight_one() {
    let (session, _tx) = scripted_session(
        vec![
            Scripted::Hang,
            Scripted::Urls(vec![Some("http://localhost:9000".to_string())]),
        ],
        no_answers(),
    );

    let first = session.start_submission(build_request()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(session.snapshot().await.submitting);

    let second = session.start_submission(build_request()).await;
    assert!(second.generation() > first.generation());

    assert_eq!(first.wait().await, None);
    assert!(second.wait().await.unwrap().is_success());

    let snapshot = session.snapshot().await;
    assert!(!snapshot.submitting);
    assert_eq!(
        snapshot.urls(),
        Some(&[Some("http://localhost:9000".to_string())][..])
    );

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_generate_solution_replaces_previous_text() {
    let provider = Arc::new(CannedProvider::new(vec![
        Ok("Check the base image.".to_string()),
        Ok("Add the file:\n```dockerfile\nCOPY requirements.txt .\n```".to_string()),
    ]));
    let (session, tx) = scripted_session(
        vec![Scripted::Fail(SubmitError::Server("COPY failed".to_string()))],
        provider.clone(),
    );

    session.submit(build_request()).await;
    tx.send("Step 3/5 : COPY requirements.txt .".to_string()).await.unwrap();
    wait_for_lines(&session.logs(), 1).await;

    assert_eq!(
        session.generate_solution().await.as_deref(),
        Some("Check the base image.")
    );
    session.generate_solution().await;

    let snapshot = session.snapshot().await;
    assert!(!snapshot.remediation.in_progress);
    assert_eq!(snapshot.error().as_deref(), Some("COPY failed"));

    let solution = render(&snapshot).error.unwrap().solution.unwrap();
    assert_eq!(
        solution,
        vec![
            Block::Paragraph(vec![Span::Plain("Add the file:".to_string())]),
            Block::Code {
                language: Some("dockerfile".to_string()),
                code: "COPY requirements.txt .".to_string(),
            },
        ]
    );

    let prompts = provider.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Error: COPY failed"));
    assert!(prompts[0].contains("Build Logs:\nStep 3/5 : COPY requirements.txt ."));

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_provider_failure_stores_fallback() {
    let provider = Arc::new(CannedProvider::new(vec![Err("quota exceeded".to_string())]));
    let (session, _tx) = scripted_session(vec![Scripted::Fail(SubmitError::NoResponse)], provider);

    session.submit(build_request()).await;
    assert_eq!(
        session.generate_solution().await.as_deref(),
        Some(FALLBACK_SOLUTION)
    );
    assert_eq!(
        session.snapshot().await.error().as_deref(),
        Some("No response received from the server. Please try again later.")
    );

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_generate_solution_without_error_does_nothing() {
    let provider = Arc::new(CannedProvider::new(vec![Ok("unused".to_string())]));
    let (session, _tx) = scripted_session(vec![Scripted::Urls(vec![])], provider.clone());

    assert_eq!(session.generate_solution().await, None);
    session.submit(build_request()).await;
    assert_eq!(session.generate_solution().await, None);
    assert!(provider.prompts.lock().unwrap().is_empty());

    session.unmount().await.unwrap();
}

#[tokio::test]
async fn test_unmount_closes_log_stream() {
    let (session, tx) = scripted_session(vec![], no_answers());

    tx.send("line".to_string()).await.unwrap();
    wait_for_lines(&session.logs(), 1).await;

    tokio::time::timeout(SHUTDOWN_DELAY, session.unmount())
        .await
        .unwrap()
        .unwrap();
    assert!(tx.send("late".to_string()).await.is_err());
}
