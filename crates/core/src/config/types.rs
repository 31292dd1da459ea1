use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::service::OutputFormat;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Job service connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service base URL (e.g., "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path that accepts job requests and streams events back
    #[serde(default = "default_submit_path")]
    pub submit_path: String,
    /// Path prefix for artifact retrieval; the file path is appended
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Fail the job when no bytes arrive for this long (0 = wait forever)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            submit_path: default_submit_path(),
            artifact_path: default_artifact_path(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_submit_path() -> String {
    "/download".to_string()
}

fn default_artifact_path() -> String {
    "/get-file".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300 // 5 minutes
}

/// Where and how artifacts are saved locally
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Format used when none is given on the command line
    #[serde(default)]
    pub default_format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            default_format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.service.submit_path, "/download");
        assert_eq!(config.service.artifact_path, "/get-file");
        assert_eq!(config.service.connect_timeout_secs, 10);
        assert_eq!(config.service.idle_timeout_secs, 300);
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert_eq!(config.output.default_format, OutputFormat::Mp3);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[service]
base_url = "https://media.example.com"
submit_path = "/api/jobs"
artifact_path = "/api/files"
connect_timeout_secs = 3
idle_timeout_secs = 0

[output]
dir = "/data/music"
default_format = "mp4"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.service.base_url, "https://media.example.com");
        assert_eq!(config.service.submit_path, "/api/jobs");
        assert_eq!(config.service.artifact_path, "/api/files");
        assert_eq!(config.service.connect_timeout_secs, 3);
        assert_eq!(config.service.idle_timeout_secs, 0);
        assert_eq!(config.output.dir, PathBuf::from("/data/music"));
        assert_eq!(config.output.default_format, OutputFormat::Mp4);
    }

    #[test]
    fn test_deserialize_unknown_format_fails() {
        let toml = r#"
[output]
default_format = "flac"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
