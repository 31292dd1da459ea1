pub mod artifact;
pub mod config;
pub mod event;
pub mod job;
pub mod orchestrator;
pub mod presentation;
pub mod service;
pub mod stream;
pub mod testing;

pub use artifact::{ArtifactDownloader, ArtifactError, SavedArtifact};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, OutputConfig, ServiceConfig,
};
pub use event::{decode_line, Event, EVENT_MARKER};
pub use job::{JobPhase, JobState, Transition};
pub use orchestrator::{
    CompletionCallback, JobHandle, JobOrchestrator, JobOutcome, JobUpdate, OrchestratorError,
};
pub use presentation::{format_eta, format_percent, phase_label};
pub use service::{
    ByteStream, HttpJobService, JobRequest, JobService, OutputFormat, RequestError, ServiceError,
};
pub use stream::{ParserStats, StreamParser};
