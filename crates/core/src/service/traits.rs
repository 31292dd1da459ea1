//! Trait definitions for the job service seam.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::error::ServiceError;
use super::types::{JobRequest, OutputFormat};

/// A body streamed back from the job service, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, ServiceError>>;

/// A service that runs download-and-convert jobs.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Returns the name of this service implementation.
    fn name(&self) -> &str;

    /// Submits a job and returns its event stream.
    ///
    /// Fails without returning a stream if the service does not accept the
    /// request (connection failure or non-success status).
    async fn start_job(&self, request: &JobRequest) -> Result<ByteStream, ServiceError>;

    /// Opens the artifact identified by the `file_path` of a completed job.
    async fn fetch_artifact(&self, file_path: &str) -> Result<ByteStream, ServiceError>;

    /// Returns the output formats the service can produce.
    fn supported_formats(&self) -> &[OutputFormat] {
        OutputFormat::ALL
    }
}
