//! Job state machine.
//!
//! ```text
//! Idle -> Downloading <-> Converting -> Succeeded
//!                  \           \-----> Failed
//!                   \----------------> Failed
//! ```
//!
//! `Succeeded` and `Failed` are terminal: once reached, further events are
//! ignored. The first terminal event wins.

use serde::Serialize;
use tracing::debug;

use crate::event::Event;

/// Stage of a job as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    #[default]
    Idle,
    Downloading,
    Converting,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of the current job.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JobState {
    pub phase: JobPhase,
    pub download_progress: f64,
    pub conversion_progress: f64,
    pub download_eta_secs: f64,
    pub conversion_eta_secs: f64,
    /// Set only when `phase == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set only when `phase == Succeeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
}

/// Effect of applying one event or failure to a [`JobState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Progress fields (and possibly the phase) changed.
    Progressed,
    /// The job reached `Succeeded`.
    Succeeded { file_path: String },
    /// The job reached `Failed`.
    Failed { message: String },
    /// The state was already terminal; nothing changed.
    Ignored,
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

impl JobState {
    /// A fresh `Idle` state with all progress zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Applies one event from the job stream.
    pub fn apply(&mut self, event: &Event) -> Transition {
        if self.is_terminal() {
            debug!(
                "Ignoring {} event after job reached {}",
                event.type_name(),
                self.phase
            );
            return Transition::Ignored;
        }

        match event {
            Event::DownloadProgress { percent, eta_secs } => {
                if *percent < self.download_progress {
                    debug!(
                        "Download progress went back from {} to {}",
                        self.download_progress, percent
                    );
                }
                self.phase = JobPhase::Downloading;
                self.download_progress = *percent;
                self.download_eta_secs = *eta_secs;
                Transition::Progressed
            }
            Event::ConversionProgress { percent, eta_secs } => {
                if *percent < self.conversion_progress {
                    debug!(
                        "Conversion progress went back from {} to {}",
                        self.conversion_progress, percent
                    );
                }
                self.phase = JobPhase::Converting;
                self.conversion_progress = *percent;
                self.conversion_eta_secs = *eta_secs;
                Transition::Progressed
            }
            Event::Complete { file_path } => {
                self.phase = JobPhase::Succeeded;
                self.result_path = Some(file_path.clone());
                Transition::Succeeded {
                    file_path: file_path.clone(),
                }
            }
            Event::Failure { message } => self.fail(message.clone()),
        }
    }

    /// Moves the job to `Failed` unless it already finished.
    ///
    /// Used for transport-level failures that have no stream event.
    pub fn fail(&mut self, message: impl Into<String>) -> Transition {
        if self.is_terminal() {
            return Transition::Ignored;
        }

        let message = message.into();
        self.phase = JobPhase::Failed;
        self.error_message = Some(message.clone());
        Transition::Failed { message }
    }
}
