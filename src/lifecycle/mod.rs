//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Metrics exporter → Catalog → Manifest loader → Mount routes → [dev] start watcher → Listen
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop watcher → Stop accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: an unreadable base directory aborts startup
//! - Routes are mounted before the listener is bound
//! - Every long-running task subscribes to one shutdown broadcast

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{mount_routes, start_metrics, start_reload, StartupError};
