//! Orchestrator types.

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::job::JobState;
use crate::service::RequestError;

/// Errors returned by [`JobOrchestrator::submit`](super::JobOrchestrator::submit).
///
/// Failures of the job itself are not errors here; they end up in the job
/// state and in [`JobOutcome::Failed`].
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid job request: {0}")]
    InvalidRequest(#[from] RequestError),
}

/// How a job run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The service produced an artifact.
    Succeeded { file_path: String },
    /// The service reported an error or the transport failed.
    Failed { message: String },
    /// The run was cancelled or superseded before finishing.
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// A state change published to observers.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    /// Which run produced this update.
    pub job_id: Uuid,
    /// State right after the change.
    pub state: JobState,
}

/// Handle to a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(id: Uuid, outcome: oneshot::Receiver<JobOutcome>) -> Self {
        Self { id, outcome }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the run to end.
    pub async fn outcome(self) -> JobOutcome {
        self.outcome.await.unwrap_or(JobOutcome::Cancelled)
    }
}
