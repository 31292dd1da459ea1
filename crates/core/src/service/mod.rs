//! Access to the external job-processing service.
//!
//! The service accepts a job request and answers with a streamed body of
//! progress events, and serves finished artifacts on a second route.
//! [`JobService`] abstracts both so the orchestrator can run against the
//! real HTTP service ([`HttpJobService`]) or a scripted mock.

mod error;
mod http;
mod traits;
mod types;

pub use error::ServiceError;
pub use http::HttpJobService;
pub use traits::{ByteStream, JobService};
pub use types::{JobRequest, OutputFormat, RequestError};
