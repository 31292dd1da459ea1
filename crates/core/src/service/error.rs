//! Error types for the job service seam.

use thiserror::Error;

/// Errors talking to the job service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Could not reach the service.
    #[error("Connection to job service failed: {0}")]
    ConnectionFailed(String),

    /// The request or a read timed out.
    #[error("Job service request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("Job service returned HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    /// The response body broke off while streaming.
    #[error("Job stream interrupted: {0}")]
    Stream(String),

    /// The requested artifact does not exist on the service.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// A URL could not be built from the configuration.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Any other HTTP client failure.
    #[error("HTTP client error: {0}")]
    Http(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl ServiceError {
    /// Message suitable for showing to the user as the job's error.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectionFailed(_) => "Could not connect to the job service".to_string(),
            Self::Timeout => "The job service did not respond in time".to_string(),
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Status { status, .. } => {
                format!("The job service rejected the request (HTTP {})", status)
            }
            Self::Stream(_) => "Connection to the job service was lost".to_string(),
            Self::ArtifactNotFound(_) => "The converted file is no longer available".to_string(),
            Self::InvalidUrl(_) | Self::Http(_) => "Network request failed".to_string(),
        }
    }

    /// Classifies a reqwest error.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Stream(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}
