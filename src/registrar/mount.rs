//! Route registration and reload.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::Middleware;
use crate::observability::metrics;
use crate::registrar::chain::compose;
use crate::registrar::loader::{LoadError, ModuleLoader};
use crate::registrar::registry::{InstalledChain, RegistryError, RouteRegistry, RouteSlot};
use crate::routing::path::PathError;
use crate::routing::walker::{DiscoveredRoute, RouteWalker, WalkError};

/// Why a single route failed to register or reload.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route path: {0}")]
    Path(#[from] PathError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{} is not a mounted route", .0.display())]
    NotMounted(PathBuf),
}

/// A route manifest that could not be mounted.
#[derive(Debug)]
pub struct RouteFailure {
    pub file: PathBuf,
    pub error: RouteError,
}

/// Outcome of a mount pass.
#[derive(Debug, Default)]
pub struct MountReport {
    pub mounted: Vec<Arc<RouteSlot>>,
    pub failures: Vec<RouteFailure>,
}

impl MountReport {
    pub fn patterns(&self) -> Vec<String> {
        self.mounted.iter().map(|s| s.path().pattern()).collect()
    }
}

/// Builds routes from manifests and installs them in a registry.
pub struct Registrar {
    walker: RouteWalker,
    loader: Arc<dyn ModuleLoader>,
    registry: Arc<RouteRegistry>,
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar").finish_non_exhaustive()
    }
}

impl Registrar {
    pub fn new(walker: RouteWalker, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            walker,
            loader,
            registry: Arc::new(RouteRegistry::new()),
        }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn walker(&self) -> &RouteWalker {
        &self.walker
    }

    /// Discover and register every route under `base`.
    ///
    /// An unreadable directory aborts the pass. Routes that fail on their own
    /// are reported and skipped.
    pub fn mount(&self, base: &Path) -> Result<MountReport, WalkError> {
        let discovered = self.walker.discover(base)?;
        let mut report = MountReport::default();

        for route in &discovered {
            match self.register(route) {
                Ok(slot) => report.mounted.push(slot),
                Err(error) => {
                    tracing::error!(
                        file = %route.file.display(),
                        error = %error,
                        "Failed to register route"
                    );
                    metrics::record_route_failure();
                    report.failures.push(RouteFailure {
                        file: route.file.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            base = %base.display(),
            mounted = report.mounted.len(),
            failed = report.failures.len(),
            "Route mount complete"
        );
        Ok(report)
    }

    /// Build and install one discovered route.
    pub fn register(&self, route: &DiscoveredRoute) -> Result<Arc<RouteSlot>, RouteError> {
        let path = route.path.clone()?;
        let chain = self.build(&route.file, &route.scopes)?;
        let methods = chain.methods();

        let slot = self.registry.install(RouteSlot::new(
            path,
            route.file.clone(),
            route.scopes.clone(),
            chain,
        ))?;

        tracing::info!(
            route = %slot.path(),
            methods = ?methods,
            file = %route.file.display(),
            "Mounted route"
        );
        metrics::record_route_mounted();
        Ok(slot)
    }

    /// Rebuild a mounted route from its manifest and swap it in.
    ///
    /// On error the previous chain stays installed.
    pub fn reload(&self, file: &Path) -> Result<Arc<InstalledChain>, RouteError> {
        let slot = self
            .registry
            .get(file)
            .ok_or_else(|| RouteError::NotMounted(file.to_path_buf()))?;

        let result = self.build(slot.file(), slot.scopes());
        metrics::record_route_reload(result.is_ok());
        let chain = result?;

        let previous = slot.replace(chain);
        let current = slot.current();
        tracing::info!(
            route = %slot.path(),
            previous = %previous.load_id,
            current = %current.load_id,
            "Reloaded route"
        );
        Ok(current)
    }

    /// Reload every route under a scope manifest.
    pub fn reload_scope(
        &self,
        scope_file: &Path,
    ) -> Vec<(PathBuf, Result<Arc<InstalledChain>, RouteError>)> {
        self.registry
            .in_scope(scope_file)
            .into_iter()
            .map(|slot| {
                let file = slot.file().to_path_buf();
                let result = self.reload(&file);
                (file, result)
            })
            .collect()
    }

    /// Load scope middleware and the route manifest, then compose.
    fn build(&self, file: &Path, scopes: &[PathBuf]) -> Result<InstalledChain, RouteError> {
        let mut inherited: Vec<Middleware> = Vec::with_capacity(scopes.len());
        for scope in scopes {
            match self.loader.load_scope(scope) {
                Ok(middleware) => inherited.extend(middleware),
                Err(LoadError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    tracing::warn!(
                        scope = %scope.display(),
                        file = %file.display(),
                        "Scope manifest removed, building route without it"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let module = self.loader.load_route(file)?;
        if module.is_empty() {
            tracing::warn!(file = %file.display(), "Route manifest exports no handlers");
        }

        Ok(InstalledChain::new(module.id, compose(&inherited, &module)))
    }
}
