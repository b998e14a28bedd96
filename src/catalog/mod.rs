//! Handler catalog subsystem.
//!
//! # Data Flow
//! ```text
//! Application startup
//!     → HandlerCatalog::handler / ::middleware (compiled Rust code, by name)
//!     → shared via Arc with the manifest loader
//!
//! Manifest load:
//!     "GET = \"get_user\""
//!     → catalog lookup → Handler (type-erased axum handler)
//! ```
//!
//! # Design Decisions
//! - Handlers are erased into `MethodRouter` so any axum handler signature
//!   (extractors included) can be named from a manifest
//! - Middleware is a boxed `Fn(Request, Next)`, the shape `from_fn` expects
//! - The catalog is immutable once shared; reloads only re-resolve names

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler as AxumHandler;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use futures_util::future::BoxFuture;

pub use builtin::builtin_catalog;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;

/// A named middleware function.
#[derive(Clone)]
pub struct Middleware {
    name: Arc<str>,
    func: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn new<F, Fut, Out>(name: &str, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse,
    {
        let func: Arc<MiddlewareFn> = Arc::new(move |req: Request, next: Next| {
            let fut = f(req, next);
            Box::pin(async move { fut.await.into_response() }) as BoxFuture<'static, Response>
        });

        Self {
            name: Arc::from(name),
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the middleware; `next` continues the chain.
    pub fn call(&self, req: Request, next: Next) -> BoxFuture<'static, Response> {
        (self.func)(req, next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// A named, type-erased request handler.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    service: MethodRouter,
}

impl Handler {
    pub fn new<H, T>(name: &str, handler: H) -> Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        Self {
            name: Arc::from(name),
            service: any(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A fresh copy of the handler service, answering every method.
    pub fn service(&self) -> MethodRouter {
        self.service.clone()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// Named handlers and middleware that route manifests refer to.
#[derive(Debug, Clone, Default)]
pub struct HandlerCatalog {
    handlers: BTreeMap<String, Handler>,
    middleware: BTreeMap<String, Middleware>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous entry.
    pub fn handler<H, T>(mut self, name: &str, handler: H) -> Self
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        self.register_handler(name, handler);
        self
    }

    pub fn register_handler<H, T>(&mut self, name: &str, handler: H)
    where
        H: AxumHandler<T, ()>,
        T: 'static,
    {
        if self
            .handlers
            .insert(name.to_string(), Handler::new(name, handler))
            .is_some()
        {
            tracing::warn!(name, "Handler registered twice, keeping the last one");
        }
    }

    /// Register a middleware function under `name`, replacing any previous entry.
    pub fn middleware<F, Fut, Out>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse,
    {
        self.register_middleware(name, f);
        self
    }

    pub fn register_middleware<F, Fut, Out>(&mut self, name: &str, f: F)
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse,
    {
        if self
            .middleware
            .insert(name.to_string(), Middleware::new(name, f))
            .is_some()
        {
            tracing::warn!(name, "Middleware registered twice, keeping the last one");
        }
    }

    pub fn get_handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn get_middleware(&self, name: &str) -> Option<&Middleware> {
        self.middleware.get(name)
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn middleware_names(&self) -> impl Iterator<Item = &str> {
        self.middleware.keys().map(String::as_str)
    }
}
