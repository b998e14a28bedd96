//! Handlers and middleware shipped with the `dirroute` binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Request};
use axum::http::{header, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::catalog::HandlerCatalog;
use crate::config::AuthConfig;

/// Catalog with `echo`, `health`, `request_log` and `require_api_key`.
pub fn builtin_catalog(auth: &AuthConfig) -> HandlerCatalog {
    let api_key: Option<Arc<str>> = auth.api_key.as_deref().map(Arc::from);

    HandlerCatalog::new()
        .handler("echo", echo)
        .handler("health", health)
        .middleware("request_log", request_log)
        .middleware("require_api_key", move |req: Request, next: Next| {
            require_api_key(api_key.clone(), req, next)
        })
}

/// Describe the request back to the caller.
async fn echo(
    method: Method,
    uri: Uri,
    Path(params): Path<HashMap<String, String>>,
) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "params": params,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

async fn require_api_key(expected: Option<Arc<str>>, req: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(req).await;
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    if presented == Some(&*expected) {
        next.run(req).await
    } else {
        tracing::debug!(path = %req.uri().path(), "Rejected request without valid API key");
        (StatusCode::UNAUTHORIZED, "Missing or invalid API key").into_response()
    }
}
