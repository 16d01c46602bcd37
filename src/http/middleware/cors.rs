//! Cross-origin policy.
//!
//! Preflight requests are answered by the layer itself and never reach the
//! parsers or handlers behind it.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{request::Parts, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer, ExposeHeaders};

use crate::config::CorsConfig;

/// Request headers always allowed.
pub const DEFAULT_ALLOW_HEADERS: [&str; 8] = [
    "accept",
    "accept-version",
    "content-type",
    "request-id",
    "origin",
    "x-api-version",
    "x-request-id",
    "x-requested-with",
];

/// Response headers always exposed.
pub const DEFAULT_EXPOSE_HEADERS: [&str; 7] = [
    "api-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "request-id",
    "response-time",
];

const ALLOWED_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from configuration.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, axum::http::header::InvalidHeaderName> {
    let allow = header_names(DEFAULT_ALLOW_HEADERS, &config.allow_headers)?;
    let expose = header_names(DEFAULT_EXPOSE_HEADERS, &config.expose_headers)?;

    Ok(CorsLayer::new()
        .allow_origin(allow_origin(&config.origins))
        .allow_methods(ALLOWED_METHODS.to_vec())
        .allow_headers(AllowHeaders::list(allow))
        .expose_headers(ExposeHeaders::list(expose))
        .max_age(Duration::from_secs(config.preflight_max_age_secs)))
}

fn header_names<const N: usize>(
    defaults: [&str; N],
    extra: &[String],
) -> Result<Vec<HeaderName>, axum::http::header::InvalidHeaderName> {
    let mut names: Vec<HeaderName> = Vec::with_capacity(N + extra.len());
    for name in defaults.iter().copied().chain(extra.iter().map(String::as_str)) {
        let name = name.parse::<HeaderName>()?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }
    let patterns: Arc<[String]> = origins.into();
    AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .map(|origin| origin_allowed(&patterns, origin))
            .unwrap_or(false)
    })
}

/// Whether `origin` matches any of `patterns`.
///
/// A pattern is `"*"`, an exact origin (case-insensitive), or an origin
/// with a single `*` such as `https://*.example.com`.
pub fn origin_allowed(patterns: &[String], origin: &str) -> bool {
    patterns.iter().any(|pattern| {
        if pattern == "*" || pattern.eq_ignore_ascii_case(origin) {
            return true;
        }
        match pattern.split_once('*') {
            Some((prefix, suffix)) => {
                let origin = origin.to_ascii_lowercase();
                origin.len() > prefix.len() + suffix.len()
                    && origin.starts_with(&prefix.to_ascii_lowercase())
                    && origin.ends_with(&suffix.to_ascii_lowercase())
            }
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_and_wildcard_origins() {
        let allowed = patterns(&["https://app.example.com", "https://*.partner.io"]);
        assert!(origin_allowed(&allowed, "https://app.example.com"));
        assert!(origin_allowed(&allowed, "HTTPS://APP.EXAMPLE.COM"));
        assert!(origin_allowed(&allowed, "https://eu.partner.io"));
        assert!(!origin_allowed(&allowed, "https://partner.io"));
        assert!(!origin_allowed(&allowed, "https://evil.example.org"));
    }

    #[test]
    fn star_allows_everything() {
        assert!(origin_allowed(&patterns(&["*"]), "http://localhost:3000"));
    }

    #[test]
    fn defaults_and_configured_headers_are_merged() {
        let names = header_names(DEFAULT_ALLOW_HEADERS, &patterns(&["API-Token", "Accept"])).unwrap();
        assert_eq!(names.len(), DEFAULT_ALLOW_HEADERS.len() + 1);
        assert!(names.contains(&HeaderName::from_static("api-token")));
    }

    #[test]
    fn invalid_header_name_is_an_error() {
        let mut config = CorsConfig::default();
        config.allow_headers.push("not a header".into());
        assert!(cors_layer(&config).is_err());
    }
}
