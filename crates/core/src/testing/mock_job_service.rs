//! Mock job service for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::RwLock;

use crate::event::Event;
use crate::service::{ByteStream, JobRequest, JobService, OutputFormat, ServiceError};

/// One step of a scripted response body.
#[derive(Debug, Clone)]
pub enum MockChunk {
    /// Deliver these bytes as one chunk.
    Bytes(Vec<u8>),
    /// Wait before the next step.
    Delay(Duration),
    /// Fail the stream with [`ServiceError::Stream`].
    Error(String),
    /// Never deliver anything again.
    Hang,
}

impl MockChunk {
    /// A chunk holding one event exactly as the service writes it.
    pub fn event(event: &Event) -> Self {
        Self::Bytes(event.to_wire_line().into_bytes())
    }

    /// A chunk of raw text.
    pub fn text(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }

    /// Splits the wire form of `events` into chunks of `size` bytes.
    pub fn split_events(events: &[Event], size: usize) -> Vec<Self> {
        let wire: Vec<u8> = events
            .iter()
            .flat_map(|e| e.to_wire_line().into_bytes())
            .collect();
        wire.chunks(size.max(1))
            .map(|c| Self::Bytes(c.to_vec()))
            .collect()
    }
}

/// How the mock answers the next job request.
#[derive(Debug)]
enum JobResponse {
    Script(Vec<MockChunk>),
    Reject(u16, Option<String>),
}

/// Mock implementation of the JobService trait.
///
/// Provides controllable behavior for testing:
/// - Scripted response bodies, consumed one per job request
/// - Rejected requests with a status and detail
/// - Artifacts served by file path
/// - Recorded requests for assertions
#[derive(Debug, Clone)]
pub struct MockJobService {
    responses: Arc<RwLock<VecDeque<JobResponse>>>,
    requests: Arc<RwLock<Vec<JobRequest>>>,
    artifacts: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    artifact_requests: Arc<RwLock<Vec<String>>>,
    supported: Vec<OutputFormat>,
}

impl Default for MockJobService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobService {
    /// Create a mock with no scripted responses.
    ///
    /// A job request without a script gets an empty body.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(VecDeque::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            artifact_requests: Arc::new(RwLock::new(Vec::new())),
            supported: OutputFormat::ALL.to_vec(),
        }
    }

    /// Restrict the formats the mock claims to support.
    pub fn with_supported_formats(mut self, formats: &[OutputFormat]) -> Self {
        self.supported = formats.to_vec();
        self
    }

    /// Queue the body for the next job request.
    pub async fn push_script(&self, script: Vec<MockChunk>) {
        self.responses
            .write()
            .await
            .push_back(JobResponse::Script(script));
    }

    /// Queue a rejection for the next job request.
    pub async fn push_rejection(&self, status: u16, detail: Option<&str>) {
        self.responses
            .write()
            .await
            .push_back(JobResponse::Reject(status, detail.map(str::to_string)));
    }

    /// Serve `content` for artifact `file_path`.
    pub async fn set_artifact(&self, file_path: &str, content: &[u8]) {
        self.artifacts
            .write()
            .await
            .insert(file_path.to_string(), content.to_vec());
    }

    /// Job requests received so far.
    pub async fn recorded_requests(&self) -> Vec<JobRequest> {
        self.requests.read().await.clone()
    }

    /// Artifact paths requested so far.
    pub async fn recorded_artifact_requests(&self) -> Vec<String> {
        self.artifact_requests.read().await.clone()
    }

    fn script_stream(script: Vec<MockChunk>) -> ByteStream {
        futures::stream::unfold(script.into_iter(), |mut steps| async move {
            loop {
                match steps.next()? {
                    MockChunk::Bytes(bytes) => return Some((Ok(Bytes::from(bytes)), steps)),
                    MockChunk::Error(reason) => {
                        return Some((Err(ServiceError::Stream(reason)), steps))
                    }
                    MockChunk::Delay(duration) => tokio::time::sleep(duration).await,
                    MockChunk::Hang => futures::future::pending::<()>().await,
                }
            }
        })
        .boxed()
    }
}

#[async_trait]
impl JobService for MockJobService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start_job(&self, request: &JobRequest) -> Result<ByteStream, ServiceError> {
        self.requests.write().await.push(request.clone());

        match self.responses.write().await.pop_front() {
            Some(JobResponse::Script(script)) => Ok(Self::script_stream(script)),
            Some(JobResponse::Reject(status, detail)) => {
                Err(ServiceError::Status { status, detail })
            }
            None => Ok(Self::script_stream(Vec::new())),
        }
    }

    async fn fetch_artifact(&self, file_path: &str) -> Result<ByteStream, ServiceError> {
        self.artifact_requests
            .write()
            .await
            .push(file_path.to_string());

        let content = self
            .artifacts
            .read()
            .await
            .get(file_path)
            .cloned()
            .ok_or_else(|| ServiceError::ArtifactNotFound(file_path.to_string()))?;

        // Serve in small chunks to exercise streaming writes.
        let chunks: Vec<MockChunk> = content
            .chunks(4096)
            .map(|c| MockChunk::Bytes(c.to_vec()))
            .collect();
        Ok(Self::script_stream(chunks))
    }

    fn supported_formats(&self) -> &[OutputFormat] {
        &self.supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_script_is_replayed_in_order() {
        let service = MockJobService::new();
        service
            .push_script(vec![
                MockChunk::text("a"),
                MockChunk::Delay(Duration::from_millis(1)),
                MockChunk::text("b"),
            ])
            .await;

        let request = JobRequest::new("https://youtu.be/x", OutputFormat::Mp3);
        let chunks: Vec<Bytes> = service
            .start_job(&request)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(chunks, vec![Bytes::from("a"), Bytes::from("b")]);
        assert_eq!(service.recorded_requests().await, vec![request]);
    }

    #[tokio::test]
    async fn test_rejection() {
        let service = MockJobService::new();
        service.push_rejection(400, Some("Invalid YouTube URL")).await;

        let request = JobRequest::new("https://youtu.be/x", OutputFormat::Mp3);
        let result = service.start_job(&request).await;

        assert!(matches!(
            result,
            Err(ServiceError::Status { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let service = MockJobService::new();
        let result = service.fetch_artifact("nope.mp3").await;
        assert!(matches!(result, Err(ServiceError::ArtifactNotFound(_))));
        assert_eq!(service.recorded_artifact_requests().await, vec!["nope.mp3"]);
    }

    #[test]
    fn test_split_events_covers_whole_wire_form() {
        let events = [Event::Complete {
            file_path: "a.mp3".to_string(),
        }];
        let chunks = MockChunk::split_events(&events, 3);
        let joined: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| match c {
                MockChunk::Bytes(b) => b,
                _ => Vec::new(),
            })
            .collect();
        assert_eq!(joined, events[0].to_wire_line().into_bytes());
    }
}
