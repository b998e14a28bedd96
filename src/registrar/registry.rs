//! Installed routes.
//!
//! # Responsibilities
//! - Own one `RouteSlot` per mounted route manifest, keyed by its path
//! - Refuse routes axum could not install next to existing ones
//! - Expose every slot to axum as a stable route
//!
//! # Design Decisions
//! - The axum route for a slot never changes; it dispatches to whatever
//!   chain the slot currently holds
//! - A chain is replaced with a single `ArcSwap::swap`; requests in flight
//!   keep the chain they loaded
//! - Slots are never removed while the server runs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::extract::Request;
use axum::response::Response;
use axum::routing::{any, MethodRouter};
use axum::Router;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tower::ServiceExt;

use crate::registrar::chain::{ChainPlan, ComposedRoute};
use crate::registrar::exports::{HttpMethod, LoadId};
use crate::routing::path::{RoutePath, Segment};

/// A route could not be added to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("route {pattern} ({}) conflicts with {existing} ({})", .file.display(), .existing_file.display())]
    Conflict {
        pattern: String,
        file: PathBuf,
        existing: String,
        existing_file: PathBuf,
    },
}

/// One version of a route's handler chains.
pub struct InstalledChain {
    pub load_id: LoadId,
    pub router: MethodRouter,
    pub plans: Vec<ChainPlan>,
}

impl InstalledChain {
    pub fn new(load_id: LoadId, composed: ComposedRoute) -> Self {
        Self {
            load_id,
            router: composed.router,
            plans: composed.plans,
        }
    }

    pub fn methods(&self) -> Vec<HttpMethod> {
        self.plans.iter().map(|p| p.method).collect()
    }
}

/// A mounted route and its current chain.
pub struct RouteSlot {
    path: RoutePath,
    file: PathBuf,
    scopes: Vec<PathBuf>,
    current: ArcSwap<InstalledChain>,
}

impl std::fmt::Debug for RouteSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSlot")
            .field("pattern", &self.path.pattern())
            .field("file", &self.file)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl RouteSlot {
    pub fn new(path: RoutePath, file: PathBuf, scopes: Vec<PathBuf>, chain: InstalledChain) -> Self {
        Self {
            path,
            file,
            scopes,
            current: ArcSwap::from_pointee(chain),
        }
    }

    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    /// Route manifest this slot was built from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Scope manifests applying to this route, outermost first.
    pub fn scopes(&self) -> &[PathBuf] {
        &self.scopes
    }

    pub fn current(&self) -> Arc<InstalledChain> {
        self.current.load_full()
    }

    /// Install a new chain, returning the one it supersedes.
    pub fn replace(&self, chain: InstalledChain) -> Arc<InstalledChain> {
        self.current.swap(Arc::new(chain))
    }

    /// Run a request through the current chain.
    pub async fn dispatch(&self, req: Request) -> Response {
        let chain = self.current.load_full();
        match chain.router.clone().oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub fn summary(&self) -> RouteSummary {
        let chain = self.current();
        RouteSummary {
            pattern: self.path.pattern(),
            file: self.file.clone(),
            load_id: chain.load_id,
            chains: chain.plans.clone(),
        }
    }
}

/// Serializable view of a mounted route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub pattern: String,
    pub file: PathBuf,
    pub load_id: LoadId,
    pub chains: Vec<ChainPlan>,
}

/// All mounted routes of one server instance.
#[derive(Default)]
pub struct RouteRegistry {
    slots: DashMap<PathBuf, Arc<RouteSlot>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot unless its path collides with a mounted route.
    pub fn install(&self, slot: RouteSlot) -> Result<Arc<RouteSlot>, RegistryError> {
        if let Some(existing) = self
            .slots
            .iter()
            .find(|s| conflicts(s.value().path(), slot.path()))
        {
            return Err(RegistryError::Conflict {
                pattern: slot.path.pattern(),
                file: slot.file.clone(),
                existing: existing.path().pattern(),
                existing_file: existing.file().to_path_buf(),
            });
        }

        let slot = Arc::new(slot);
        self.slots.insert(slot.file.clone(), Arc::clone(&slot));
        Ok(slot)
    }

    pub fn get(&self, file: &Path) -> Option<Arc<RouteSlot>> {
        self.slots.get(file).map(|s| Arc::clone(s.value()))
    }

    /// Slots whose chains include the given scope manifest.
    pub fn in_scope(&self, scope_file: &Path) -> Vec<Arc<RouteSlot>> {
        let mut slots: Vec<_> = self
            .slots
            .iter()
            .filter(|s| s.scopes().iter().any(|f| f == scope_file))
            .map(|s| Arc::clone(s.value()))
            .collect();
        slots.sort_by_key(|s| s.path().pattern());
        slots
    }

    /// Every slot, ordered by pattern.
    pub fn slots(&self) -> Vec<Arc<RouteSlot>> {
        let mut slots: Vec<_> = self.slots.iter().map(|s| Arc::clone(s.value())).collect();
        slots.sort_by_key(|s| s.path().pattern());
        slots
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.slots().iter().map(|s| s.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// An axum router with one route per slot.
    pub fn router(&self) -> Router {
        self.slots().into_iter().fold(Router::new(), |router, slot| {
            let pattern = slot.path().axum_pattern();
            router.route(
                &pattern,
                any(move |req: Request| {
                    let slot = Arc::clone(&slot);
                    async move { slot.dispatch(req).await }
                }),
            )
        })
    }
}

/// Whether axum would reject installing both paths in one router.
///
/// Identical shapes collide. At the first position where the paths differ,
/// two parameters with different names, or a catch-all next to anything
/// dynamic, also collide.
fn conflicts(a: &RoutePath, b: &RoutePath) -> bool {
    let (sa, sb) = (a.segments(), b.segments());
    for (x, y) in sa.iter().zip(sb) {
        match (x, y) {
            (Segment::Static(p), Segment::Static(q)) if p == q => continue,
            (Segment::Param(p), Segment::Param(q)) if p == q => continue,
            (Segment::Param(_), Segment::Param(_)) => return true,
            (Segment::CatchAll(_), Segment::Param(_) | Segment::CatchAll(_))
            | (Segment::Param(_), Segment::CatchAll(_)) => return true,
            _ => return false,
        }
    }
    sa.len() == sb.len()
}
