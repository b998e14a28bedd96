//! Route registration subsystem.
//!
//! # Data Flow
//! ```text
//! DiscoveredRoute (path, manifest, scope manifests)
//!     → loader.rs (scope exports + route exports, fresh read)
//!     → chain.rs (scope → route → method middleware → handler)
//!     → registry.rs (RouteSlot keyed by manifest path)
//!     → axum Router (one stable route per slot)
//!
//! On reload:
//!     manifest changed
//!     → loader.rs + chain.rs rebuild off to the side
//!     → on success, atomic swap of the slot's chain
//!     → on failure, previous chain keeps serving
//! ```
//!
//! # Design Decisions
//! - Exports are validated at load time into `RouteModule`, one optional
//!   field per method
//! - Failures are isolated per route; only walk errors are fatal
//! - The registry belongs to the registrar, not to process-wide state

pub mod chain;
pub mod exports;
pub mod loader;
pub mod mount;
pub mod registry;

pub use chain::{compose, ChainPlan};
pub use exports::{HttpMethod, LoadId, RouteModule};
pub use loader::{LoadError, ManifestLoader, ModuleLoader};
pub use mount::{MountReport, Registrar, RouteError, RouteFailure};
pub use registry::{InstalledChain, RouteRegistry, RouteSlot, RouteSummary};
