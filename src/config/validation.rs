//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks value ranges and
//! header/media-type syntax. Every violation is reported, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a [`ServiceConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.name must not be empty")]
    EmptyName,

    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.port must be a positive integer")]
    ZeroPort,

    #[error("cors.origins contains an empty entry")]
    EmptyOrigin,

    #[error("cors origin pattern `{0}` may contain at most one `*`")]
    InvalidOriginPattern(String),

    #[error("`{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("`{0}` is not a media type")]
    InvalidMediaType(String),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every violation.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    for origin in &config.cors.origins {
        if origin.trim().is_empty() {
            errors.push(ValidationError::EmptyOrigin);
        } else if origin != "*" && origin.matches('*').count() > 1 {
            errors.push(ValidationError::InvalidOriginPattern(origin.clone()));
        }
    }

    for name in config.cors.allow_headers.iter().chain(&config.cors.expose_headers) {
        if name.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    for media in &config.accept.acceptable {
        if !is_media_type(media) {
            errors.push(ValidationError::InvalidMediaType(media.clone()));
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_media_type(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, sub)) => {
            !kind.is_empty() && !sub.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_violation() {
        let mut config = ServiceConfig::default();
        config.server.name = "  ".into();
        config.server.port = 0;
        config.cors.allow_headers.push("bad header".into());
        config.accept.acceptable.push("json".into());
        config.limits.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyName,
                ValidationError::ZeroPort,
                ValidationError::InvalidHeaderName("bad header".into()),
                ValidationError::InvalidMediaType("json".into()),
                ValidationError::ZeroBodyLimit,
            ]
        );
    }

    #[test]
    fn rejects_origin_with_two_wildcards() {
        let mut config = ServiceConfig::default();
        config.cors.origins = vec!["https://*.*.example.com".into()];
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidOriginPattern(
                "https://*.*.example.com".into()
            )])
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("nowhere".into())])
        );
    }
}
