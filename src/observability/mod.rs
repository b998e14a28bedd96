//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (mount and reload counters)
//!
//! HTTP requests:
//!     → tower-http TraceLayer spans, tagged with x-request-id
//! ```
//!
//! # Design Decisions
//! - Structured fields (route, file, load_id) on every registration event
//! - Request ID flows through every route's chain
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
