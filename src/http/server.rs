//! HTTP server setup.
//!
//! # Responsibilities
//! - Turn the route registry into an axum app
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until shutdown is signalled

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::registrar::RouteRegistry;

/// HTTP server for the mounted routes.
pub struct AppServer {
    router: Router,
}

impl AppServer {
    /// Build the app from every route currently in `registry`.
    ///
    /// Routes keep dispatching to their registry slot, so reloads need no
    /// rebuild here.
    pub fn new(config: &ServerConfig, registry: &RouteRegistry) -> Self {
        Self {
            router: Self::build_router(config, registry),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, registry: &RouteRegistry) -> Router {
        registry
            .router()
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id_of(req),
                )
            }))
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
