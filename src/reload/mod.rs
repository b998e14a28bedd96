//! Development-mode route reloading.
//!
//! # Data Flow
//! ```text
//! notify event (create/modify under base dir)
//!     → mpsc channel → debounce window (batch of paths)
//!     → classify_change: route manifest / scope manifest / new file
//!     → Registrar::reload or ::reload_scope
//! ```
//!
//! # Design Decisions
//! - Only files mounted at startup are reloaded; new ones need a restart
//! - Removed files keep serving their last chain

pub mod watcher;

pub use watcher::{apply_changes, classify_change, ChangeTarget, RouteWatcher};
