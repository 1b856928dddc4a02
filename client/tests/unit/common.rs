//! Fake build service and shared fixtures

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, Stream, StreamExt};

use buildrun::app::log_buffer::LogBuffer;
use buildrun::form::{validate, BuildRequest, FormState, Upload};
use buildrun::http::client::{BuildService, SubmitError};
use buildrun::remediation::{CompletionProvider, ProviderError};

/// One multipart field as the fake service received it
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Canned reply of the fake build endpoint
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Clone)]
struct FakeState {
    reply: Reply,
    log_lines: Arc<Vec<String>>,
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

/// Build service on an ephemeral local port
pub struct FakeBuildService {
    pub base_url: String,
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

impl FakeBuildService {
    pub async fn start(reply: Reply, log_lines: &[&str]) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            reply,
            log_lines: Arc::new(log_lines.iter().map(|s| s.to_string()).collect()),
            received: received.clone(),
        };

        let router = Router::new()
            .route("/api/v1/build_and_run", post(build_and_run))
            .route("/api/v1/logs", get(logs))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            received,
        }
    }

    pub fn received(&self) -> Vec<ReceivedField> {
        self.received.lock().unwrap().clone()
    }
}

async fn build_and_run(State(state): State<FakeState>, mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default().to_vec();
        state.received.lock().unwrap().push(ReceivedField {
            name,
            file_name,
            data,
        });
    }

    let reply = state.reply.clone();
    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
}

async fn logs(
    State(state): State<FakeState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events: Vec<Result<Event, Infallible>> = state
        .log_lines
        .iter()
        .map(|line| Ok(Event::default().data(line.as_str())))
        .collect();
    Sse::new(stream::iter(events).chain(stream::pending()))
}

/// A request that passed the validation gate
pub fn build_request() -> BuildRequest {
    let mut form = FormState::new("web", "8080");
    form.select_dockerfile(Some(Upload::new("Dockerfile", "FROM alpine\nCMD [\"sh\"]\n")));
    form.select_archive(Some(Upload::new("app.zip", vec![0x50, 0x4b, 0x03, 0x04])));
    validate(&mut form).unwrap()
}

/// Poll until the buffer holds `count` lines
pub async fn wait_for_lines(logs: &LogBuffer, count: usize) -> Vec<String> {
    for _ in 0..200 {
        if logs.len().await >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    logs.lines().await
}

/// Scripted replies for a build service double
#[derive(Debug, Clone)]
pub enum Scripted {
    Urls(Vec<Option<String>>),
    Fail(SubmitError),
    Hang,
}

pub struct ScriptedService {
    replies: Mutex<VecDeque<Scripted>>,
}

impl ScriptedService {
    pub fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl BuildService for ScriptedService {
    async fn build_and_run(&self, _request: BuildRequest) -> Result<Vec<Option<String>>, SubmitError> {
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Scripted::Urls(urls)) => Ok(urls),
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(SubmitError::NoResponse),
        }
    }
}

/// Completion provider returning canned answers in order
pub struct CannedProvider {
    answers: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedProvider {
    pub fn new(answers: Vec<Result<String, String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-1"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ProviderError::ProviderError(message)),
            None => Err(ProviderError::EmptyResponse),
        }
    }
}
