//! Directory walker.
//!
//! # Responsibilities
//! - Visit the base directory depth-first, in file name order
//! - Track the directory names below the base (URL segments)
//! - Track the scope middleware files inherited by each subtree
//! - Emit one `DiscoveredRoute` per route manifest
//!
//! # Design Decisions
//! - Entries are sorted so output never depends on `read_dir` order
//! - Each subtree gets its own copy of the scope list
//! - Symlinks are not followed (no cycles)
//! - Any unreadable directory aborts the walk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::routing::convention::{ConventionFile, FileConvention};
use crate::routing::path::{PathError, RoutePath};

/// A directory could not be enumerated.
#[derive(Debug, Error)]
#[error("failed to read directory {}: {source}", .path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A route manifest found during the walk.
#[derive(Debug, Clone)]
pub struct DiscoveredRoute {
    /// Resolved path, or why the directory names do not form one.
    pub path: Result<RoutePath, PathError>,
    /// Absolute location of the route manifest.
    pub file: PathBuf,
    /// Scope middleware manifests that apply, outermost directory first.
    pub scopes: Vec<PathBuf>,
}

/// Walks a base directory and maps it to routes.
#[derive(Debug, Clone)]
pub struct RouteWalker {
    convention: FileConvention,
    prefix: String,
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

impl RouteWalker {
    pub fn new(convention: FileConvention, prefix: impl Into<String>) -> Self {
        Self {
            convention,
            prefix: prefix.into(),
        }
    }

    pub fn convention(&self) -> &FileConvention {
        &self.convention
    }

    /// Discover every route manifest under `base`.
    ///
    /// The base directory is canonicalized so manifest paths are stable keys
    /// that match what the file watcher reports.
    pub fn discover(&self, base: &Path) -> Result<Vec<DiscoveredRoute>, WalkError> {
        let base = fs::canonicalize(base).map_err(|source| WalkError {
            path: base.to_path_buf(),
            source,
        })?;

        let mut routes = Vec::new();
        let mut segments = Vec::new();
        self.visit(&base, &mut segments, &[], &mut routes)?;
        Ok(routes)
    }

    fn visit(
        &self,
        dir: &Path,
        segments: &mut Vec<String>,
        inherited: &[PathBuf],
        out: &mut Vec<DiscoveredRoute>,
    ) -> Result<(), WalkError> {
        let entries = read_sorted(dir)?;

        let mut scopes = inherited.to_vec();
        let mut scope_files = entries.iter().filter(|e| {
            !e.is_dir && self.convention.classify(&e.name) == Some(ConventionFile::ScopeMiddleware)
        });
        if let Some(scope) = scope_files.next() {
            scopes.push(scope.path.clone());
        }
        for ignored in scope_files {
            tracing::warn!(
                file = %ignored.path.display(),
                "Directory already has a scope middleware file, ignoring"
            );
        }

        for entry in &entries {
            if entry.is_dir {
                segments.push(entry.name.clone());
                let result = self.visit(&entry.path, segments, &scopes, out);
                segments.pop();
                result?;
            } else if self.convention.classify(&entry.name) == Some(ConventionFile::Route) {
                out.push(DiscoveredRoute {
                    path: RoutePath::resolve(&self.prefix, segments.as_slice()),
                    file: entry.path.clone(),
                    scopes: scopes.clone(),
                });
            }
        }

        Ok(())
    }
}

fn read_sorted(dir: &Path) -> Result<Vec<Entry>, WalkError> {
    let err = |source| WalkError {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(err)? {
        let entry = entry.map_err(err)?;
        let file_type = entry.file_type().map_err(err)?;
        if file_type.is_symlink() {
            tracing::debug!(path = %entry.path().display(), "Skipping symlink");
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };

        entries.push(Entry {
            name,
            path: entry.path(),
            is_dir: file_type.is_dir(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
