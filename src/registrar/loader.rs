//! Manifest loading.
//!
//! # Responsibilities
//! - Read a manifest fresh from disk on every load
//! - Parse TOML or JSON into a flat export table
//! - Validate export keys and resolve names against the catalog
//! - Stamp each load with a new `LoadId`
//!
//! # Design Decisions
//! - Unknown keys are ignored, recognized keys are strict
//! - A `<METHOD>_middleware` without its handler is dropped with a warning
//! - Nothing is cached; a reload always sees the bytes on disk

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::catalog::{Handler, HandlerCatalog, Middleware};
use crate::registrar::exports::{
    HttpMethod, LoadId, MethodExport, RouteModule, ROUTE_MIDDLEWARE_KEY, SCOPE_MIDDLEWARE_KEY,
};

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported manifest format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("export '{export}' in {} is not callable (found {found})", .path.display())]
    NotCallable {
        path: PathBuf,
        export: String,
        found: &'static str,
    },

    #[error("export '{export}' in {} names unknown handler '{name}'", .path.display())]
    UnknownHandler {
        path: PathBuf,
        export: String,
        name: String,
    },

    #[error("export '{export}' in {} names unknown middleware '{name}'", .path.display())]
    UnknownMiddleware {
        path: PathBuf,
        export: String,
        name: String,
    },
}

/// Source of route and scope exports.
pub trait ModuleLoader: Send + Sync {
    /// Load a route manifest.
    fn load_route(&self, path: &Path) -> Result<RouteModule, LoadError>;

    /// Load a scope manifest. `Ok(None)` when it exports no middleware.
    fn load_scope(&self, path: &Path) -> Result<Option<Middleware>, LoadError>;
}

/// Loads TOML/JSON manifests whose exports name catalog entries.
#[derive(Debug)]
pub struct ManifestLoader {
    catalog: Arc<HandlerCatalog>,
    next_id: AtomicU64,
}

impl ManifestLoader {
    pub fn new(catalog: Arc<HandlerCatalog>) -> Self {
        Self {
            catalog,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    fn next_load_id(&self) -> LoadId {
        LoadId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn resolve_handler(&self, path: &Path, export: &str, value: &Value) -> Result<Handler, LoadError> {
        let name = export_name(path, export, value)?;
        self.catalog
            .get_handler(name)
            .cloned()
            .ok_or_else(|| LoadError::UnknownHandler {
                path: path.to_path_buf(),
                export: export.to_string(),
                name: name.to_string(),
            })
    }

    fn resolve_middleware(
        &self,
        path: &Path,
        export: &str,
        value: &Value,
    ) -> Result<Middleware, LoadError> {
        let name = export_name(path, export, value)?;
        self.catalog
            .get_middleware(name)
            .cloned()
            .ok_or_else(|| LoadError::UnknownMiddleware {
                path: path.to_path_buf(),
                export: export.to_string(),
                name: name.to_string(),
            })
    }
}

impl ModuleLoader for ManifestLoader {
    fn load_route(&self, path: &Path) -> Result<RouteModule, LoadError> {
        let exports = read_exports(path)?;
        let mut module = RouteModule::empty(self.next_load_id(), path);
        let mut method_middleware = Vec::new();

        for (key, value) in &exports {
            if key == ROUTE_MIDDLEWARE_KEY {
                module.middleware = Some(self.resolve_middleware(path, key, value)?);
            } else if let Some(method) = HttpMethod::from_export(key) {
                let handler = self.resolve_handler(path, key, value)?;
                *module.method_mut(method) = Some(MethodExport {
                    handler,
                    middleware: None,
                });
            } else if let Some(method) = HttpMethod::from_middleware_export(key) {
                method_middleware.push((method, key, value));
            } else {
                tracing::debug!(file = %path.display(), export = %key, "Ignoring unknown export");
            }
        }

        for (method, key, value) in method_middleware {
            if module.method(method).is_none() {
                tracing::warn!(
                    file = %path.display(),
                    export = %key,
                    "Method middleware without a {} handler, ignoring",
                    method
                );
                continue;
            }
            let middleware = self.resolve_middleware(path, key, value)?;
            if let Some(export) = module.method_mut(method) {
                export.middleware = Some(middleware);
            }
        }

        tracing::debug!(
            file = %path.display(),
            load_id = %module.id,
            methods = module.methods().count(),
            "Loaded route manifest"
        );
        Ok(module)
    }

    fn load_scope(&self, path: &Path) -> Result<Option<Middleware>, LoadError> {
        let exports = read_exports(path)?;
        let middleware = exports
            .get(SCOPE_MIDDLEWARE_KEY)
            .map(|value| self.resolve_middleware(path, SCOPE_MIDDLEWARE_KEY, value))
            .transpose()?;

        if middleware.is_none() {
            tracing::debug!(file = %path.display(), "Scope manifest exports no middleware");
        }
        Ok(middleware)
    }
}

/// Read a manifest into a flat key → value table.
fn read_exports(path: &Path) -> Result<BTreeMap<String, Value>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text).map_err(|e| parse_err(e.to_string())),
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string())),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn export_name<'v>(path: &Path, export: &str, value: &'v Value) -> Result<&'v str, LoadError> {
    value.as_str().ok_or_else(|| LoadError::NotCallable {
        path: path.to_path_buf(),
        export: export.to_string(),
        found: value_kind(value),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Request;
    use axum::middleware::Next;
    use axum::response::Response;

    async fn ok() -> &'static str {
        "ok"
    }

    async fn pass(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    fn loader() -> ManifestLoader {
        let catalog = HandlerCatalog::new()
            .handler("get_user", ok)
            .handler("create_user", ok)
            .middleware("auth", pass)
            .middleware("audit", pass);
        ManifestLoader::new(Arc::new(catalog))
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_toml_route() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "route.toml",
            r#"
            GET = "get_user"
            POST = "create_user"
            middleware = "audit"
            POST_middleware = "auth"
            description = "ignored"
            "#,
        );

        let module = loader().load_route(&path).unwrap();
        assert_eq!(module.middleware.as_ref().unwrap().name(), "audit");
        assert_eq!(module.get.as_ref().unwrap().handler.name(), "get_user");
        assert!(module.get.as_ref().unwrap().middleware.is_none());
        let post = module.post.as_ref().unwrap();
        assert_eq!(post.handler.name(), "create_user");
        assert_eq!(post.middleware.as_ref().unwrap().name(), "auth");
        assert!(module.put.is_none());
    }

    #[test]
    fn test_load_json_route() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.json", r#"{ "GET": "get_user" }"#);

        let module = loader().load_route(&path).unwrap();
        let methods: Vec<_> = module.methods().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get]);
    }

    #[test]
    fn test_every_load_gets_a_new_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.toml", "GET = \"get_user\"\n");
        let loader = loader();

        let first = loader.load_route(&path).unwrap();
        let second = loader.load_route(&path).unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
    }

    #[test]
    fn test_reads_fresh_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.toml", "GET = \"get_user\"\n");
        let loader = loader();
        assert!(loader.load_route(&path).unwrap().post.is_none());

        write(dir.path(), "route.toml", "GET = \"get_user\"\nPOST = \"create_user\"\n");
        assert!(loader.load_route(&path).unwrap().post.is_some());
    }

    #[test]
    fn test_non_string_export_is_not_callable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.toml", "GET = 42\n");

        match loader().load_route(&path) {
            Err(LoadError::NotCallable { export, found, .. }) => {
                assert_eq!(export, "GET");
                assert_eq!(found, "number");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_names_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.toml", "GET = \"missing\"\n");
        assert!(matches!(
            loader().load_route(&path),
            Err(LoadError::UnknownHandler { .. })
        ));

        let path = write(
            dir.path(),
            "route.toml",
            "GET = \"get_user\"\nGET_middleware = \"missing\"\n",
        );
        assert!(matches!(
            loader().load_route(&path),
            Err(LoadError::UnknownMiddleware { .. })
        ));
    }

    #[test]
    fn test_orphan_method_middleware_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "route.toml",
            "GET = \"get_user\"\nPUT_middleware = \"whatever\"\n",
        );

        let module = loader().load_route(&path).unwrap();
        assert!(module.put.is_none());
    }

    #[test]
    fn test_scope_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "parentMiddleware.toml", "default = \"auth\"\n");
        assert_eq!(
            loader().load_scope(&path).unwrap().unwrap().name(),
            "auth"
        );

        let path = write(dir.path(), "parentMiddleware.json", "{}");
        assert!(loader().load_scope(&path).unwrap().is_none());
    }

    #[test]
    fn test_parse_and_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "route.toml", "GET = \n");
        assert!(matches!(
            loader().load_route(&path),
            Err(LoadError::Parse { .. })
        ));

        assert!(matches!(
            loader().load_route(&dir.path().join("gone.toml")),
            Err(LoadError::Io { .. })
        ));

        let path = write(dir.path(), "route.yaml", "GET: get_user\n");
        assert!(matches!(
            loader().load_route(&path),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }
}
