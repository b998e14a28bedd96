//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! dirroute.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CLI flags override individual fields in main
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route reloads never touch it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::AuthConfig;
pub use schema::ObservabilityConfig;
pub use schema::RoutesConfig;
pub use schema::ServerConfig;
