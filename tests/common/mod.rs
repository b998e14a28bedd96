//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, Request as HttpRequest, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use dirroute::catalog::HandlerCatalog;
use dirroute::registrar::{ManifestLoader, Registrar};
use dirroute::routing::{FileConvention, RouteWalker};

/// Middleware names registered by [`test_catalog`].
pub const TRACERS: &[&str] = &["auth_check", "A", "B", "R", "M"];

/// Create `files` (relative path, contents) under a fresh temp directory.
///
/// Returns the guard and the canonical base path.
pub fn tree(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    for (rel, contents) in files {
        write(&base, rel, contents);
    }
    (dir, base)
}

pub fn write(base: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = base.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Middleware appending its name to the `x-trace` request header.
async fn trace_step(name: &'static str, mut req: Request, next: Next) -> Response {
    let trace = match req.headers().get("x-trace") {
        Some(v) => format!("{},{name}", v.to_str().unwrap()),
        None => name.to_string(),
    };
    req.headers_mut()
        .insert("x-trace", HeaderValue::from_str(&trace).unwrap());
    next.run(req).await
}

/// Handler answering with the trace so far plus its own name.
fn traced(
    name: &'static str,
) -> impl Fn(Request) -> std::future::Ready<String> + Clone + Send + Sync + 'static {
    move |req: Request| {
        let trace = req
            .headers()
            .get("x-trace")
            .map(|v| format!("{},", v.to_str().unwrap()))
            .unwrap_or_default();
        std::future::ready(format!("{trace}{name}"))
    }
}

/// Catalog of tracing handlers (`H`, `H2`, `get_user`) and [`TRACERS`].
pub fn test_catalog() -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new()
        .handler("H", traced("H"))
        .handler("H2", traced("H2"))
        .handler("get_user", traced("get_user"));
    for &name in TRACERS {
        catalog.register_middleware(name, move |req: Request, next: Next| {
            trace_step(name, req, next)
        });
    }
    catalog
}

pub fn registrar() -> Registrar {
    Registrar::new(
        RouteWalker::new(FileConvention::default(), "/api"),
        Arc::new(ManifestLoader::new(Arc::new(test_catalog()))),
    )
}

/// Send a request through `router`, returning status and body text.
pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let req = HttpRequest::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
