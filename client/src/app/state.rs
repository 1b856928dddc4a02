//! Session state management

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::http::client::SubmitError;

/// Result of one completed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Result URLs; entries may be null
    Succeeded(Vec<Option<String>>),

    /// User-visible failure
    Failed(SubmitError),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded(_))
    }
}

/// Remediation progress and latest suggestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationState {
    pub in_progress: bool,
    pub text: Option<String>,
}

/// Mutable per-session state
///
/// `generation` identifies the current submission attempt. Results from an
/// older attempt are discarded.
#[derive(Debug, Default)]
pub struct SessionState {
    generation: u64,
    outcome: Option<SubmissionOutcome>,
    show_logs: bool,
    solution: Option<String>,
}

impl SessionState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset for a new attempt and return its generation
    pub(crate) fn begin_submission(&mut self) -> u64 {
        self.generation += 1;
        self.outcome = None;
        self.solution = None;
        self.show_logs = true;
        self.generation
    }

    /// Store an outcome if it belongs to the current attempt
    pub(crate) fn complete_submission(&mut self, generation: u64, outcome: SubmissionOutcome) -> bool {
        if generation != self.generation {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    /// Store a suggestion if no newer submission has started since it was requested
    pub(crate) fn store_solution(&mut self, generation: u64, text: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.solution = Some(text);
        true
    }

    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    /// User-visible error message, if the last submission failed
    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            Some(SubmissionOutcome::Failed(e)) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// In-flight tracking shared with RAII guards
///
/// Guards release on drop, so every exit path (including task abort) clears
/// the flag they acquired.
#[derive(Debug, Default)]
pub struct Activity {
    submission: AtomicU64,
    remediations: AtomicUsize,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.load(Ordering::SeqCst) != 0
    }

    pub fn is_generating_solution(&self) -> bool {
        self.remediations.load(Ordering::SeqCst) > 0
    }

    /// Mark `generation` as the in-flight submission
    pub fn acquire_submission(self: &Arc<Self>, generation: u64) -> InFlightGuard {
        self.submission.store(generation, Ordering::SeqCst);
        InFlightGuard {
            activity: Arc::clone(self),
            generation,
        }
    }

    pub fn acquire_remediation(self: &Arc<Self>) -> RemediationGuard {
        self.remediations.fetch_add(1, Ordering::SeqCst);
        RemediationGuard {
            activity: Arc::clone(self),
        }
    }
}

/// Holds the in-flight flag for one submission generation
#[derive(Debug)]
pub struct InFlightGuard {
    activity: Arc<Activity>,
    generation: u64,
}

impl InFlightGuard {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // A newer submission owns the flag now; leave it alone.
        let _ = self.activity.submission.compare_exchange(
            self.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Holds the remediation in-progress flag
#[derive(Debug)]
pub struct RemediationGuard {
    activity: Arc<Activity>,
}

impl Drop for RemediationGuard {
    fn drop(&mut self) {
        self.activity.remediations.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time copy of everything the renderer needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub outcome: Option<SubmissionOutcome>,
    pub show_logs: bool,
    pub logs: Vec<String>,
    pub submitting: bool,
    pub remediation: RemediationState,
}

impl SessionSnapshot {
    pub(crate) fn capture(state: &SessionState, activity: &Activity, logs: Vec<String>) -> Self {
        Self {
            outcome: state.outcome.clone(),
            show_logs: state.show_logs,
            logs,
            submitting: activity.is_submitting(),
            remediation: RemediationState {
                in_progress: activity.is_generating_solution(),
                text: state.solution.clone(),
            },
        }
    }

    pub fn urls(&self) -> Option<&[Option<String>]> {
        match &self.outcome {
            Some(SubmissionOutcome::Succeeded(urls)) => Some(urls),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            Some(SubmissionOutcome::Failed(e)) => Some(e.to_string()),
            _ => None,
        }
    }
}
