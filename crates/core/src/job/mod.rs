//! Client-side job state derived from stream events.

mod state;

pub use state::{JobPhase, JobState, Transition};
