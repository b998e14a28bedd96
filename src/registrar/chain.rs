//! Middleware chain composition.
//!
//! For every exported method the chain is, outermost first:
//!
//! ```text
//! scope middleware (base dir → deepest dir)
//!     → route middleware (`middleware` export)
//!     → method middleware (`<METHOD>_middleware` export)
//!     → method handler
//! ```
//!
//! `MethodRouter::layer` wraps the existing service, so layers are applied
//! innermost first to obtain that order.

use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::routing::MethodRouter;
use serde::Serialize;

use crate::catalog::Middleware;
use crate::registrar::exports::{HttpMethod, RouteModule};

/// Names of the steps one method's request passes through, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainPlan {
    pub method: HttpMethod,
    pub steps: Vec<String>,
}

/// Method router for one route plus the plan of each installed chain.
#[derive(Clone)]
pub struct ComposedRoute {
    pub router: MethodRouter,
    pub plans: Vec<ChainPlan>,
}

/// Build the method router for `module` under the inherited scope middleware.
///
/// Methods without a handler are left unset; axum answers them with 405.
pub fn compose(inherited: &[Middleware], module: &RouteModule) -> ComposedRoute {
    let mut router: MethodRouter = MethodRouter::new();
    let mut plans = Vec::new();

    for (method, export) in module.methods() {
        let layers: Vec<&Middleware> = inherited
            .iter()
            .chain(module.middleware.as_ref())
            .chain(export.middleware.as_ref())
            .collect();

        let service = layers
            .iter()
            .rev()
            .fold(export.handler.service(), |service, mw| wrap(service, mw));
        router = router.on_service(method.filter(), service);

        let steps = layers
            .iter()
            .map(|mw| mw.name().to_string())
            .chain(std::iter::once(export.handler.name().to_string()))
            .collect();
        plans.push(ChainPlan { method, steps });
    }

    ComposedRoute { router, plans }
}

fn wrap(service: MethodRouter, middleware: &Middleware) -> MethodRouter {
    let middleware = middleware.clone();
    service.layer(from_fn(move |req: Request, next: Next| middleware.call(req, next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Handler;
    use crate::registrar::exports::{LoadId, MethodExport};
    use axum::body::Body;
    use axum::http::{HeaderValue, Request as HttpRequest, StatusCode};
    use axum::response::Response;
    use std::path::Path;
    use tower::ServiceExt;

    /// Middleware that appends its name to the `x-trace` request header.
    fn tracer(name: &'static str) -> Middleware {
        Middleware::new(name, move |mut req: Request, next: Next| {
            let trace = match req.headers().get("x-trace") {
                Some(v) => format!("{},{name}", v.to_str().unwrap()),
                None => name.to_string(),
            };
            req.headers_mut()
                .insert("x-trace", HeaderValue::from_str(&trace).unwrap());
            next.run(req)
        })
    }

    async fn echo_trace(req: Request) -> Response {
        let trace = req
            .headers()
            .get("x-trace")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        Response::new(Body::from(format!("{trace},H")))
    }

    async fn body_of(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn module(route_mw: Option<Middleware>, get_mw: Option<Middleware>) -> RouteModule {
        let mut module = RouteModule::empty(LoadId(1), Path::new("route.toml"));
        module.middleware = route_mw;
        module.get = Some(MethodExport {
            handler: Handler::new("H", echo_trace),
            middleware: get_mw,
        });
        module
    }

    #[tokio::test]
    async fn test_chain_order_is_scope_then_method_then_handler() {
        let inherited = vec![tracer("A"), tracer("B")];
        let composed = compose(&inherited, &module(None, Some(tracer("M"))));

        assert_eq!(
            composed.plans,
            vec![ChainPlan {
                method: HttpMethod::Get,
                steps: vec!["A".into(), "B".into(), "M".into(), "H".into()],
            }]
        );

        let res = composed
            .router
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_of(res).await, "A,B,M,H");
    }

    #[tokio::test]
    async fn test_route_middleware_sits_between_scope_and_method() {
        let inherited = vec![tracer("A")];
        let composed = compose(&inherited, &module(Some(tracer("R")), Some(tracer("M"))));

        let res = composed
            .router
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_of(res).await, "A,R,M,H");
    }

    #[tokio::test]
    async fn test_unexported_methods_are_not_allowed() {
        let composed = compose(&[], &module(None, None));
        let res = composed
            .router
            .oneshot(HttpRequest::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
