//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the config file.
//! Every section has defaults so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and request handling settings.
    pub server: ServerConfig,

    /// Route discovery settings.
    pub routes: RoutesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Credentials used by the built-in middleware.
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Total time allowed for a request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Route discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Directory scanned for route manifests.
    pub base_dir: PathBuf,

    /// URL prefix every discovered route is mounted under.
    pub mount_prefix: String,

    /// Watch the base directory and reload routes on change.
    pub dev_mode: bool,

    /// File stem of route manifests (`route.toml`).
    pub route_file: String,

    /// File stem of scope middleware manifests (`parentMiddleware.toml`).
    pub middleware_file: String,

    /// Accepted manifest extensions, without the dot.
    pub extensions: Vec<String>,

    /// Window in which change events are batched before reloading.
    pub reload_debounce_ms: u64,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./api"),
            mount_prefix: "/api".to_string(),
            dev_mode: false,
            route_file: "route".to_string(),
            middleware_file: "parentMiddleware".to_string(),
            extensions: vec!["toml".to_string(), "json".to_string()],
            reload_debounce_ms: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token expected by `require_api_key`. `None` disables the check.
    pub api_key: Option<String>,
}
