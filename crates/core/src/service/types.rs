//! Request types for the job service.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Output formats the conversion engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Audio only, MPEG Audio Layer III.
    #[default]
    Mp3,
    /// Video with audio in an MP4 container.
    Mp4,
}

impl OutputFormat {
    /// Every format, in display order.
    pub const ALL: &'static [OutputFormat] = &[OutputFormat::Mp3, OutputFormat::Mp4];

    /// The value sent in the `format` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "mp4" => Ok(Self::Mp4),
            _ => Err(RequestError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Reasons a job request is rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Media URL is empty")]
    EmptyUrl,

    #[error("Media URL is not valid: {0}")]
    InvalidUrl(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// One job: fetch `url` and convert it to `format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: String,
    pub format: OutputFormat,
}

impl JobRequest {
    pub fn new(url: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            url: url.into().trim().to_string(),
            format,
        }
    }

    /// Parses both fields from user input.
    pub fn parse(url: &str, format: &str) -> Result<Self, RequestError> {
        let format = format.parse()?;
        let request = Self::new(url, format);
        request.validate(OutputFormat::ALL)?;
        Ok(request)
    }

    /// Checks the request against what the service accepts.
    pub fn validate(&self, supported: &[OutputFormat]) -> Result<(), RequestError> {
        if self.url.trim().is_empty() {
            return Err(RequestError::EmptyUrl);
        }

        let parsed =
            url::Url::parse(&self.url).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RequestError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(RequestError::InvalidUrl("missing host".to_string()));
        }

        if !supported.contains(&self.format) {
            return Err(RequestError::UnsupportedFormat(self.format.to_string()));
        }

        Ok(())
    }

    /// Form fields sent with the job request.
    pub fn form_fields(&self) -> [(&'static str, &str); 2] {
        [("url", self.url.as_str()), ("format", self.format.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("mp3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
        assert_eq!(" MP4 ".parse::<OutputFormat>().unwrap(), OutputFormat::Mp4);
        assert_eq!(
            "wav".parse::<OutputFormat>(),
            Err(RequestError::UnsupportedFormat("wav".to_string()))
        );
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Mp4).unwrap();
        assert_eq!(json, "\"mp4\"");
        let parsed: OutputFormat = serde_json::from_str("\"mp3\"").unwrap();
        assert_eq!(parsed, OutputFormat::Mp3);
    }

    #[test]
    fn test_parse_valid_request() {
        let request = JobRequest::parse("  https://www.youtube.com/watch?v=dQw4w9WgXcQ ", "mp3")
            .unwrap();
        assert_eq!(request.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(request.format, OutputFormat::Mp3);
    }

    #[test]
    fn test_empty_url_rejected() {
        assert_eq!(JobRequest::parse("   ", "mp3"), Err(RequestError::EmptyUrl));
    }

    #[test]
    fn test_non_http_url_rejected() {
        assert!(matches!(
            JobRequest::parse("file:///etc/passwd", "mp3"),
            Err(RequestError::InvalidUrl(_))
        ));
        assert!(matches!(
            JobRequest::parse("youtube.com/watch?v=x", "mp3"),
            Err(RequestError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_format_outside_supported_set_rejected() {
        let request = JobRequest::new("https://youtu.be/dQw4w9WgXcQ", OutputFormat::Mp4);
        assert_eq!(
            request.validate(&[OutputFormat::Mp3]),
            Err(RequestError::UnsupportedFormat("mp4".to_string()))
        );
    }

    #[test]
    fn test_form_fields() {
        let request = JobRequest::new("https://youtu.be/abc", OutputFormat::Mp4);
        assert_eq!(
            request.form_fields(),
            [("url", "https://youtu.be/abc"), ("format", "mp4")]
        );
    }
}
