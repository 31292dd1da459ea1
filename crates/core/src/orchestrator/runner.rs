//! Job orchestrator implementation.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::event::Event;
use crate::job::{JobState, Transition};
use crate::service::{JobRequest, JobService};
use crate::stream::StreamParser;

use super::types::{JobHandle, JobOutcome, JobUpdate, OrchestratorError};

/// Callback invoked once with the artifact's file path when a job succeeds.
pub type CompletionCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Capacity of the update channel; slow observers lag and skip updates.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Reported when the body ends without a terminal event.
const STREAM_ENDED_MESSAGE: &str = "The job ended unexpectedly without producing a file";

/// Reported when the body stalls longer than the idle timeout.
const STREAM_STALLED_MESSAGE: &str = "The job service stopped sending progress";

/// The run currently reading a job stream.
struct ActiveJob {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveJob {
    /// Cancels the run and waits until its task has stopped.
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Job {} task ended abnormally: {}", self.id, e);
        }
    }
}

/// Submits jobs to a [`JobService`] and tracks the current one.
pub struct JobOrchestrator {
    service: Arc<dyn JobService>,
    idle_timeout: Option<Duration>,
    on_complete: Option<CompletionCallback>,
    state: Arc<RwLock<JobState>>,
    updates: broadcast::Sender<JobUpdate>,
    active: Mutex<Option<ActiveJob>>,
}

impl JobOrchestrator {
    /// Create a new orchestrator.
    pub fn new(service: Arc<dyn JobService>, config: &ServiceConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let idle_timeout = match config.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            service,
            idle_timeout,
            on_complete: None,
            state: Arc::new(RwLock::new(JobState::new())),
            updates,
            active: Mutex::new(None),
        }
    }

    /// Set the side effect to run when a job produces its artifact.
    pub fn with_completion_callback(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    /// Override the idle timeout (`None` waits forever).
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Subscribe to state changes of all future runs.
    pub fn subscribe(&self) -> broadcast::Receiver<JobUpdate> {
        self.updates.subscribe()
    }

    /// Snapshot of the current job state.
    pub async fn state(&self) -> JobState {
        self.state.read().await.clone()
    }

    /// Whether a run is still reading its stream.
    pub async fn is_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|job| !job.task.is_finished())
    }

    /// Starts a new job, cancelling the one in flight.
    ///
    /// The request is validated before anything is sent. On success the job
    /// state is reset to `Idle` and the read loop runs in the background;
    /// use the returned handle to wait for the outcome.
    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, OrchestratorError> {
        request.validate(self.service.supported_formats())?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!("Cancelling job {} in favour of a new submission", previous.id);
            previous.shutdown().await;
        }

        let job_id = Uuid::new_v4();
        let fresh = JobState::new();
        *self.state.write().await = fresh.clone();
        let _ = self.updates.send(JobUpdate {
            job_id,
            state: fresh,
        });

        let cancel = CancellationToken::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let run = JobRun {
            id: job_id,
            service: Arc::clone(&self.service),
            idle_timeout: self.idle_timeout,
            on_complete: self.on_complete.clone(),
            state: Arc::clone(&self.state),
            updates: self.updates.clone(),
        };

        let span = info_span!("job", id = %job_id, format = %request.format);
        let token = cancel.clone();
        let task = tokio::spawn(
            async move {
                let outcome = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!("Job cancelled");
                        JobOutcome::Cancelled
                    }
                    outcome = run.drive(&request) => outcome,
                };
                let _ = outcome_tx.send(outcome);
            }
            .instrument(span),
        );

        *active = Some(ActiveJob {
            id: job_id,
            cancel,
            task,
        });

        Ok(JobHandle::new(job_id, outcome_rx))
    }

    /// Cancels the job in flight, if any.
    ///
    /// The job state is left as it was; the next `submit` resets it.
    /// Returns whether there was a run to cancel.
    pub async fn cancel(&self) -> bool {
        let Some(job) = self.active.lock().await.take() else {
            return false;
        };
        debug!("Cancelling job {}", job.id);
        job.shutdown().await;
        true
    }
}

/// Everything one run of the read loop needs.
struct JobRun {
    id: Uuid,
    service: Arc<dyn JobService>,
    idle_timeout: Option<Duration>,
    on_complete: Option<CompletionCallback>,
    state: Arc<RwLock<JobState>>,
    updates: broadcast::Sender<JobUpdate>,
}

impl JobRun {
    /// Reads the job stream until a terminal event or transport failure.
    async fn drive(&self, request: &JobRequest) -> JobOutcome {
        let mut stream = match self.service.start_job(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Job request failed: {}", e);
                return self.fail(e.user_message()).await;
            }
        };

        let mut parser = StreamParser::new();
        loop {
            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("No data from job service for {:?}", limit);
                        return self.fail(STREAM_STALLED_MESSAGE).await;
                    }
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    let mut terminal = None;
                    for event in parser.feed(&chunk) {
                        terminal = self.apply(&event).await;
                        if terminal.is_some() {
                            break;
                        }
                    }
                    // Bytes after the terminal event are never read.
                    if let Some(outcome) = terminal {
                        debug!("Parser stats at terminal event: {:?}", parser.stats());
                        return outcome;
                    }
                }
                Some(Err(e)) => {
                    warn!("Job stream failed: {}", e);
                    return self.fail(e.user_message()).await;
                }
                None => {
                    let stats = parser.stats();
                    parser.finish();
                    warn!(
                        "Job stream closed without a result ({} events decoded)",
                        stats.events
                    );
                    return self.fail(STREAM_ENDED_MESSAGE).await;
                }
            }
        }
    }

    /// Applies one event; returns the outcome if it ended the job.
    async fn apply(&self, event: &Event) -> Option<JobOutcome> {
        let mut state = self.state.write().await;
        let transition = state.apply(event);
        let snapshot = state.clone();
        drop(state);

        self.finish_transition(transition, snapshot)
    }

    /// Moves the job to `Failed` for a reason outside the event stream.
    async fn fail(&self, message: impl Into<String>) -> JobOutcome {
        let message = message.into();
        let mut state = self.state.write().await;
        let transition = state.fail(message.clone());
        let snapshot = state.clone();
        drop(state);

        self.finish_transition(transition, snapshot)
            .unwrap_or(JobOutcome::Failed { message })
    }

    /// Publishes a transition and runs the completion side effect.
    fn finish_transition(&self, transition: Transition, snapshot: JobState) -> Option<JobOutcome> {
        if transition == Transition::Ignored {
            return None;
        }

        let _ = self.updates.send(JobUpdate {
            job_id: self.id,
            state: snapshot,
        });

        match transition {
            Transition::Succeeded { file_path } => {
                info!("Job succeeded, artifact: {}", file_path);
                if let Some(callback) = &self.on_complete {
                    callback(&file_path);
                }
                Some(JobOutcome::Succeeded { file_path })
            }
            Transition::Failed { message } => {
                info!("Job failed: {}", message);
                Some(JobOutcome::Failed { message })
            }
            Transition::Progressed | Transition::Ignored => None,
        }
    }
}
