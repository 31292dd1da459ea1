//! HTTP implementation of the job service.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;

use super::{ByteStream, JobRequest, JobService, ServiceError};

/// Error body returned by the service on rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Job service reached over HTTP.
pub struct HttpJobService {
    client: Client,
    config: ServiceConfig,
}

impl HttpJobService {
    /// Create a new HTTP job service client.
    ///
    /// No overall request timeout is set: job streams stay open for as long
    /// as the job runs. Stalls are handled by the orchestrator's idle timeout.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn submit_url(&self) -> String {
        format!("{}{}", self.base_url(), self.config.submit_path)
    }

    /// Builds the artifact URL. The file path comes from the service and
    /// may contain anything, so it is encoded as a single path segment.
    fn artifact_url(&self, file_path: &str) -> Result<reqwest::Url, ServiceError> {
        let url = format!(
            "{}{}/{}",
            self.base_url(),
            self.config.artifact_path.trim_end_matches('/'),
            urlencoding::encode(file_path)
        );
        reqwest::Url::parse(&url).map_err(|e| ServiceError::InvalidUrl(e.to_string()))
    }

    /// Turns a non-success response into an error, keeping the service's
    /// `detail` text when it sent one.
    async fn status_error(response: Response) -> ServiceError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| match b.detail {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            });

        ServiceError::Status { status, detail }
    }

    fn into_byte_stream(response: Response) -> ByteStream {
        response
            .bytes_stream()
            .map_err(ServiceError::from_reqwest)
            .boxed()
    }
}

#[async_trait]
impl JobService for HttpJobService {
    fn name(&self) -> &str {
        "http"
    }

    async fn start_job(&self, request: &JobRequest) -> Result<ByteStream, ServiceError> {
        let url = self.submit_url();
        info!("Submitting {} job for {} to {}", request.format, request.url, url);

        let response = self
            .client
            .post(&url)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        if !response.status().is_success() {
            let err = Self::status_error(response).await;
            warn!("Job request rejected: {}", err);
            return Err(err);
        }

        debug!("Job accepted, streaming events");
        Ok(Self::into_byte_stream(response))
    }

    async fn fetch_artifact(&self, file_path: &str) -> Result<ByteStream, ServiceError> {
        let url = self.artifact_url(file_path)?;
        debug!("Fetching artifact from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::ArtifactNotFound(file_path.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        Ok(Self::into_byte_stream(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> HttpJobService {
        HttpJobService::new(ServiceConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_submit_url_trims_trailing_slash() {
        let service = service("http://localhost:8000/");
        assert_eq!(service.submit_url(), "http://localhost:8000/download");
    }

    #[test]
    fn test_artifact_url_encodes_whole_path_as_one_segment() {
        let service = service("http://localhost:8000");

        let url = service.artifact_url("My Song (Live).mp3").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/get-file/My%20Song%20%28Live%29.mp3"
        );

        let url = service.artifact_url("../../etc/passwd").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/get-file/..%2F..%2Fetc%2Fpasswd"
        );
    }

    #[test]
    fn test_artifact_url_encodes_query_characters() {
        let service = service("http://localhost:8000");
        let url = service.artifact_url("a?b#c&d.mp4").unwrap();
        assert_eq!(url.path(), "/get-file/a%3Fb%23c%26d.mp4");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_name() {
        assert_eq!(service("http://localhost:8000").name(), "http");
    }
}
