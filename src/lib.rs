//! Directory-convention route registration for axum.
//!
//! A directory tree of route manifests becomes an axum router: each
//! directory is a URL path segment (`[id]` is a parameter, a trailing
//! `index` is dropped), `route.<ext>` names the method handlers and
//! `parentMiddleware.<ext>` adds middleware to the whole subtree.

// Core subsystems
pub mod catalog;
pub mod registrar;
pub mod routing;

// Serving
pub mod http;
pub mod reload;
pub mod validation;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use catalog::{builtin_catalog, HandlerCatalog};
pub use config::AppConfig;
pub use http::AppServer;
pub use lifecycle::Shutdown;
pub use registrar::{Registrar, RouteRegistry};
pub use validation::{check, JsonSchema, SafeParse};
