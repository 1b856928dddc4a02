//! Submission controller
//!
//! Drives one build request: resets the session, holds the in-flight flag,
//! calls the build service and stores the outcome.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, info_span, warn, Instrument};

use crate::app::log_buffer::LogBuffer;
use crate::app::state::{Activity, InFlightGuard, SessionState, SubmissionOutcome};
use crate::form::state::BuildRequest;
use crate::http::client::BuildService;
use crate::utils::generate_uuid;

pub struct SubmissionController {
    service: Arc<dyn BuildService>,
    state: Arc<RwLock<SessionState>>,
    activity: Arc<Activity>,
    logs: Arc<LogBuffer>,
}

impl SubmissionController {
    pub fn new(
        service: Arc<dyn BuildService>,
        state: Arc<RwLock<SessionState>>,
        activity: Arc<Activity>,
        logs: Arc<LogBuffer>,
    ) -> Self {
        Self {
            service,
            state,
            activity,
            logs,
        }
    }

    /// Reset the session for a new attempt and take the in-flight flag
    ///
    /// Clears output, error, suggestion and logs before returning, so the
    /// request that follows never sees a previous attempt's state.
    pub async fn begin(&self) -> InFlightGuard {
        let generation = self.state.write().await.begin_submission();
        let guard = self.activity.acquire_submission(generation);
        self.logs.clear().await;
        guard
    }

    /// Send the request and store its outcome; the guard is released on
    /// every path, including cancellation of this future
    pub async fn run(&self, guard: InFlightGuard, request: BuildRequest) -> SubmissionOutcome {
        let generation = guard.generation();
        let span = info_span!("submission", id = %generate_uuid(), generation);

        async move {
            info!("Submitting image {:?} on endpoint {}", request.image_name, request.endpoint);

            let outcome = match self.service.build_and_run(request).await {
                Ok(urls) => {
                    info!("Build succeeded with {} url(s)", urls.iter().flatten().count());
                    SubmissionOutcome::Succeeded(urls)
                }
                Err(e) => {
                    warn!("Build failed: {}", e);
                    SubmissionOutcome::Failed(e)
                }
            };

            if !self
                .state
                .write()
                .await
                .complete_submission(generation, outcome.clone())
            {
                info!("Discarding outcome of superseded submission");
            }

            drop(guard);
            outcome
        }
        .instrument(span)
        .await
    }

    /// [`begin`](Self::begin) then [`run`](Self::run)
    pub async fn submit(&self, request: BuildRequest) -> SubmissionOutcome {
        let guard = self.begin().await;
        self.run(guard, request).await
    }
}
