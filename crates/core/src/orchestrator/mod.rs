//! Job orchestrator: submits one job at a time and drives its state.
//!
//! The orchestrator owns the [`JobState`](crate::job::JobState) of the
//! current job. Each submission runs a read loop on a tokio task that feeds
//! the response body through a fresh [`StreamParser`](crate::stream::StreamParser)
//! and applies every decoded event in arrival order. Observers get each
//! applied transition through a broadcast channel.
//!
//! Submitting a new job first cancels and awaits the previous run, so two
//! runs never write to the same state.

mod runner;
mod types;

pub use runner::{CompletionCallback, JobOrchestrator};
pub use types::{JobHandle, JobOutcome, JobUpdate, OrchestratorError};
