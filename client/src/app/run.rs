//! Client session lifecycle
//!
//! A session is mounted once: it opens the log subscription and starts the
//! collector. Submissions and remediation requests run against it until it
//! is unmounted, which closes the subscription exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info};

use crate::app::log_buffer::LogBuffer;
use crate::app::options::AppOptions;
use crate::app::state::{Activity, SessionSnapshot, SessionState, SubmissionOutcome};
use crate::app::submit::SubmissionController;
use crate::errors::ClientError;
use crate::form::state::BuildRequest;
use crate::http::client::{BuildClient, BuildService};
use crate::remediation::{CompletionProvider, GeminiProvider, RemediationAssistant};
use crate::workers::collector;
use crate::workers::log_stream::LogStream;

/// Handle to one spawned submission
pub struct SubmissionTask {
    generation: u64,
    handle: JoinHandle<SubmissionOutcome>,
}

impl SubmissionTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the outcome; `None` when the submission was superseded
    pub async fn wait(self) -> Option<SubmissionOutcome> {
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => {
                info!("Submission {} was cancelled", self.generation);
                None
            }
            Err(e) => {
                error!("Submission {} failed: {}", self.generation, e);
                None
            }
        }
    }
}

/// A mounted client session
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    activity: Arc<Activity>,
    logs: Arc<LogBuffer>,
    controller: Arc<SubmissionController>,
    assistant: Arc<RemediationAssistant>,
    current: Mutex<Option<AbortHandle>>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: ShutdownManager,
}

impl Session {
    /// Mount a session against the configured build and completion services
    pub async fn mount(options: AppOptions) -> Result<Self, ClientError> {
        info!("Mounting session for {}", options.backend.base_url);

        let client = BuildClient::new(&options.backend)?;
        let stream = LogStream::open(
            options.log_stream.clone(),
            client.stream_client(),
            client.logs_url(),
        );
        let provider = GeminiProvider::new(options.remediation)
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        Ok(Self::with_parts(
            Arc::new(client),
            Arc::new(provider),
            stream,
            options.lifecycle.max_shutdown_delay,
        ))
    }

    /// Mount a session from already-built parts
    pub fn with_parts(
        service: Arc<dyn BuildService>,
        provider: Arc<dyn CompletionProvider>,
        stream: LogStream,
        max_shutdown_delay: Duration,
    ) -> Self {
        let state = Arc::new(RwLock::new(SessionState::default()));
        let activity = Arc::new(Activity::new());
        let logs = Arc::new(LogBuffer::new());
        let controller = Arc::new(SubmissionController::new(
            service,
            state.clone(),
            activity.clone(),
            logs.clone(),
        ));

        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), max_shutdown_delay);

        let collector_handle = spawn_collector(stream, logs.clone(), shutdown_tx.subscribe());
        shutdown_manager.with_collector_handle(collector_handle);

        Self {
            state,
            activity,
            logs,
            controller,
            assistant: Arc::new(RemediationAssistant::new(provider)),
            current: Mutex::new(None),
            shutdown_tx,
            shutdown_manager,
        }
    }

    pub fn logs(&self) -> Arc<LogBuffer> {
        self.logs.clone()
    }

    /// Shutdown signal for tasks that should stop with the session
    pub fn shutdown_signal(&self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        Box::pin(async move {
            let _ = shutdown_rx.recv().await;
        })
    }

    /// Start a submission, cancelling any still in flight
    ///
    /// The session is reset before this returns, so the new request is never
    /// sent before output, error, suggestion and logs are cleared.
    pub async fn start_submission(&self, request: BuildRequest) -> SubmissionTask {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            if !previous.is_finished() {
                info!("Cancelling previous submission");
                previous.abort();
            }
        }

        let guard = self.controller.begin().await;
        let generation = guard.generation();
        let controller = self.controller.clone();
        let handle = tokio::spawn(async move { controller.run(guard, request).await });

        *current = Some(handle.abort_handle());
        SubmissionTask { generation, handle }
    }

    /// Submit and wait for the outcome
    pub async fn submit(&self, request: BuildRequest) -> Option<SubmissionOutcome> {
        self.start_submission(request).await.wait().await
    }

    /// Ask the completion service for a fix to the current error
    ///
    /// Returns the stored text, or `None` when there is no error to fix or a
    /// newer submission started meanwhile.
    pub async fn generate_solution(&self) -> Option<String> {
        let (generation, error) = {
            let state = self.state.read().await;
            (state.generation(), state.error()?)
        };

        let _guard = self.activity.acquire_remediation();
        let logs = self.logs.lines().await;
        let text = self.assistant.generate_solution(&error, &logs).await;

        if self.state.write().await.store_solution(generation, text.clone()) {
            Some(text)
        } else {
            info!("Discarding suggestion for superseded submission");
            None
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let logs = self.logs.lines().await;
        let state = self.state.read().await;
        SessionSnapshot::capture(&state, &self.activity, logs)
    }

    /// Tear the session down: cancel any submission and close the log stream
    pub async fn unmount(mut self) -> Result<(), ClientError> {
        if let Some(current) = self.current.lock().await.take() {
            current.abort();
        }
        self.shutdown_manager.shutdown().await
    }
}

fn spawn_collector(
    stream: LogStream,
    logs: Arc<LogBuffer>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        collector::run(
            stream,
            logs,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    })
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: Duration,
    collector_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, max_shutdown_delay: Duration) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay,
            collector_handle: None,
        }
    }

    fn with_collector_handle(&mut self, handle: JoinHandle<()>) {
        self.collector_handle = Some(handle);
    }

    async fn shutdown(&mut self) -> Result<(), ClientError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.max_shutdown_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, abandoning workers",
                    self.max_shutdown_delay
                );
                if let Some(handle) = self.collector_handle.take() {
                    handle.abort();
                }
                Err(ClientError::ShutdownError("timed out".to_string()))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ClientError> {
        info!("Unmounting session...");

        if let Some(handle) = self.collector_handle.as_mut() {
            let result = handle.await;
            self.collector_handle = None;
            result.map_err(|e| ClientError::ShutdownError(e.to_string()))?;
        }

        info!("Session unmounted");
        Ok(())
    }
}
