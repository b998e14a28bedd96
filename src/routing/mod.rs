//! Route mapping subsystem.
//!
//! # Data Flow
//! ```text
//! base directory
//!     → walker.rs (depth-first, sorted, scope files accumulated)
//!     → convention.rs (route.<ext> / parentMiddleware.<ext>)
//!     → path.rs (segments → /api/users/:id)
//!     → DiscoveredRoute[] handed to the registrar
//! ```
//!
//! # Design Decisions
//! - Mapping is pure: same tree, same routes, same order
//! - Path errors belong to one route, walk errors to the whole pass
//! - No I/O beyond directory listing; manifests are read by the registrar

pub mod convention;
pub mod path;
pub mod walker;

pub use convention::{ConventionFile, FileConvention};
pub use path::{PathError, RoutePath, Segment};
pub use walker::{DiscoveredRoute, RouteWalker, WalkError};
