//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter before anything records
//! - Build the manifest loader over the handler catalog
//! - Mount every route under the base directory
//! - Start the route watcher in development mode

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::catalog::HandlerCatalog;
use crate::config::{ObservabilityConfig, RoutesConfig};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registrar::{ManifestLoader, MountReport, Registrar};
use crate::reload::RouteWatcher;
use crate::routing::{FileConvention, RouteWalker, WalkError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to mount routes: {0}")]
    Mount(#[from] WalkError),

    #[error("failed to start route watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// Start the Prometheus exporter when enabled.
///
/// Call before [`mount_routes`]; counters recorded earlier are lost.
pub fn start_metrics(config: &ObservabilityConfig) -> bool {
    if !config.metrics_enabled {
        return false;
    }

    match config.metrics_address.parse() {
        Ok(addr) => match metrics::init_metrics(addr) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start metrics exporter");
                false
            }
        },
        Err(_) => {
            tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            );
            false
        }
    }
}

/// Mount every route under `config.base_dir`.
pub fn mount_routes(
    config: &RoutesConfig,
    catalog: HandlerCatalog,
) -> Result<(Arc<Registrar>, MountReport), StartupError> {
    let walker = RouteWalker::new(FileConvention::from_config(config), config.mount_prefix.clone());
    let loader = ManifestLoader::new(Arc::new(catalog));
    let registrar = Arc::new(Registrar::new(walker, Arc::new(loader)));

    let report = registrar.mount(&config.base_dir)?;
    for failure in &report.failures {
        tracing::warn!(
            file = %failure.file.display(),
            error = %failure.error,
            "Route skipped"
        );
    }

    Ok((registrar, report))
}

/// Start watching the base directory when dev mode is on.
pub fn start_reload(
    config: &RoutesConfig,
    registrar: &Arc<Registrar>,
    shutdown: &Shutdown,
) -> Result<Option<JoinHandle<()>>, StartupError> {
    if !config.dev_mode {
        tracing::debug!("Dev mode off, routes are fixed");
        return Ok(None);
    }

    let watcher = RouteWatcher::new(
        &config.base_dir,
        Duration::from_millis(config.reload_debounce_ms),
    );
    let handle = watcher.spawn(Arc::clone(registrar), shutdown.subscribe())?;
    Ok(Some(handle))
}
