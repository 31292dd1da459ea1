use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Service base URL parses and uses http or https
/// - Submit and artifact paths are absolute
/// - Connect timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let service = &config.service;

    let base_url = url::Url::parse(&service.base_url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "service.base_url '{}' is not a valid URL: {}",
            service.base_url, e
        ))
    })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "service.base_url must use http or https, got '{}'",
            base_url.scheme()
        )));
    }

    for (name, path) in [
        ("service.submit_path", &service.submit_path),
        ("service.artifact_path", &service.artifact_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "{} must start with '/', got '{}'",
                name, path
            )));
        }
    }

    if service.connect_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "service.connect_timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
