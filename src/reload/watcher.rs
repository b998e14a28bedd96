//! Base directory watcher for development reloads.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::registrar::Registrar;
use crate::routing::ConventionFile;

/// What a changed path means for the mounted routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTarget {
    /// A mounted route manifest.
    Route(PathBuf),
    /// A scope manifest with mounted routes beneath it.
    Scope(PathBuf),
    /// A convention file that is not part of the mounted tree yet.
    Unmounted(PathBuf),
    Ignored,
}

/// Decide what a changed path affects.
pub fn classify_change(registrar: &Registrar, path: &Path) -> ChangeTarget {
    let registry = registrar.registry();
    if registry.get(path).is_some() {
        return ChangeTarget::Route(path.to_path_buf());
    }

    let kind = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| registrar.walker().convention().classify(n));

    match kind {
        Some(ConventionFile::ScopeMiddleware) if !registry.in_scope(path).is_empty() => {
            ChangeTarget::Scope(path.to_path_buf())
        }
        Some(_) => ChangeTarget::Unmounted(path.to_path_buf()),
        None => ChangeTarget::Ignored,
    }
}

/// Reload whatever a batch of changed paths affects.
pub fn apply_changes(registrar: &Registrar, paths: &BTreeSet<PathBuf>) {
    for path in paths {
        match classify_change(registrar, path) {
            ChangeTarget::Route(file) => {
                if let Err(e) = registrar.reload(&file) {
                    tracing::error!(
                        file = %file.display(),
                        error = %e,
                        "Reload failed, keeping previous route"
                    );
                }
            }
            ChangeTarget::Scope(file) => {
                for (route, result) in registrar.reload_scope(&file) {
                    if let Err(e) = result {
                        tracing::error!(
                            scope = %file.display(),
                            file = %route.display(),
                            error = %e,
                            "Reload failed, keeping previous route"
                        );
                    }
                }
            }
            ChangeTarget::Unmounted(file) => {
                tracing::info!(
                    file = %file.display(),
                    "New convention file detected, restart to mount it"
                );
            }
            ChangeTarget::Ignored => {}
        }
    }
}

/// Watches the base directory and reloads affected routes.
pub struct RouteWatcher {
    base: PathBuf,
    debounce: Duration,
}

impl RouteWatcher {
    pub fn new(base: &Path, debounce: Duration) -> Self {
        Self {
            base: base.to_path_buf(),
            debounce,
        }
    }

    /// Start watching. The returned task ends when `shutdown` fires.
    pub fn spawn(
        self,
        registrar: Arc<Registrar>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> notify::Result<JoinHandle<()>> {
        let base = std::fs::canonicalize(&self.base).map_err(notify::Error::io)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                } else if matches!(event.kind, EventKind::Remove(_)) {
                    for path in &event.paths {
                        tracing::warn!(
                            path = %path.display(),
                            "File removed, routes keep their last registration"
                        );
                    }
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        })?;
        watcher.watch(&base, RecursiveMode::Recursive)?;
        tracing::info!(path = %base.display(), "Route watcher started");

        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            // Dropping the watcher stops notifications.
            let _watcher: RecommendedWatcher = watcher;

            loop {
                let first = tokio::select! {
                    _ = shutdown.recv() => break,
                    next = rx.recv() => match next {
                        Some(path) => path,
                        None => break,
                    },
                };

                let mut batch = BTreeSet::from([first]);
                let window = tokio::time::sleep(debounce);
                tokio::pin!(window);
                loop {
                    tokio::select! {
                        _ = &mut window => break,
                        next = rx.recv() => match next {
                            Some(path) => {
                                batch.insert(path);
                            }
                            None => break,
                        },
                    }
                }

                tracing::debug!(changed = batch.len(), "Applying file changes");
                apply_changes(&registrar, &batch);
            }

            tracing::info!("Route watcher stopped");
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HandlerCatalog;
    use crate::registrar::ManifestLoader;
    use crate::routing::{FileConvention, RouteWalker};
    use std::fs;

    async fn ok() -> &'static str {
        "ok"
    }

    fn setup() -> (tempfile::TempDir, PathBuf, Registrar) {
        let dir = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(base.join("admin/reports")).unwrap();
        fs::write(base.join("admin/parentMiddleware.toml"), "").unwrap();
        fs::write(base.join("admin/reports/route.toml"), "GET = \"ok\"\n").unwrap();
        fs::write(base.join("notes.md"), "").unwrap();

        let catalog = Arc::new(HandlerCatalog::new().handler("ok", ok));
        let registrar = Registrar::new(
            RouteWalker::new(FileConvention::default(), "/api"),
            Arc::new(ManifestLoader::new(catalog)),
        );
        let report = registrar.mount(&base).unwrap();
        assert_eq!(report.mounted.len(), 1);
        (dir, base, registrar)
    }

    #[test]
    fn test_classify_change() {
        let (_dir, base, registrar) = setup();

        let route = base.join("admin/reports/route.toml");
        assert_eq!(
            classify_change(&registrar, &route),
            ChangeTarget::Route(route.clone())
        );

        let scope = base.join("admin/parentMiddleware.toml");
        assert_eq!(
            classify_change(&registrar, &scope),
            ChangeTarget::Scope(scope.clone())
        );

        let fresh = base.join("users/route.toml");
        assert_eq!(
            classify_change(&registrar, &fresh),
            ChangeTarget::Unmounted(fresh.clone())
        );

        assert_eq!(
            classify_change(&registrar, &base.join("notes.md")),
            ChangeTarget::Ignored
        );
    }

    #[test]
    fn test_apply_changes_reloads_route() {
        let (_dir, base, registrar) = setup();
        let route = base.join("admin/reports/route.toml");
        let before = registrar.registry().get(&route).unwrap().current().load_id;

        apply_changes(&registrar, &BTreeSet::from([route.clone(), base.join("notes.md")]));

        let after = registrar.registry().get(&route).unwrap().current().load_id;
        assert!(after > before);
    }
}
