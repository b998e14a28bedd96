//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work. All problems are collected rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    let routes = &config.routes;
    if !routes.mount_prefix.is_empty() && !routes.mount_prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "routes.mount_prefix",
            "must be empty or start with '/'",
        ));
    }

    for (field, stem) in [
        ("routes.route_file", &routes.route_file),
        ("routes.middleware_file", &routes.middleware_file),
    ] {
        if stem.is_empty() || stem.contains(['/', '\\', '.']) {
            errors.push(ValidationError::new(
                field,
                format!("'{stem}' must be a bare file stem"),
            ));
        }
    }

    if routes.route_file == routes.middleware_file {
        errors.push(ValidationError::new(
            "routes.middleware_file",
            "must differ from routes.route_file",
        ));
    }

    if routes.extensions.is_empty() {
        errors.push(ValidationError::new(
            "routes.extensions",
            "at least one extension is required",
        ));
    }

    for ext in &routes.extensions {
        if !matches!(ext.as_str(), "toml" | "json") {
            errors.push(ValidationError::new(
                "routes.extensions",
                format!("unsupported manifest extension '{ext}'"),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
