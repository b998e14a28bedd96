//! Exports read from a route manifest.

use std::fmt;
use std::path::{Path, PathBuf};

use axum::routing::MethodFilter;
use serde::Serialize;

use crate::catalog::{Handler, Middleware};

/// Export key naming route-scoped middleware.
pub const ROUTE_MIDDLEWARE_KEY: &str = "middleware";

/// Export key naming a scope manifest's middleware.
pub const SCOPE_MIDDLEWARE_KEY: &str = "default";

const METHOD_MIDDLEWARE_SUFFIX: &str = "_middleware";

/// HTTP methods a route manifest may export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Parse an export key. Case-sensitive: `get` is not a method export.
    pub fn from_export(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// Parse a `<METHOD>_middleware` export key.
    pub fn from_middleware_export(key: &str) -> Option<Self> {
        key.strip_suffix(METHOD_MIDDLEWARE_SUFFIX)
            .and_then(Self::from_export)
    }

    pub fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Options => MethodFilter::OPTIONS,
            HttpMethod::Head => MethodFilter::HEAD,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one manifest load. Never reused within a process, so two
/// loads of the same file are always distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LoadId(pub u64);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handler and optional middleware exported for one method.
#[derive(Debug, Clone)]
pub struct MethodExport {
    pub handler: Handler,
    pub middleware: Option<Middleware>,
}

/// A route manifest as loaded at one point in time.
#[derive(Debug, Clone)]
pub struct RouteModule {
    pub id: LoadId,
    pub source: PathBuf,
    /// Route-scoped middleware, applied to every exported method.
    pub middleware: Option<Middleware>,
    pub get: Option<MethodExport>,
    pub post: Option<MethodExport>,
    pub put: Option<MethodExport>,
    pub delete: Option<MethodExport>,
    pub patch: Option<MethodExport>,
    pub options: Option<MethodExport>,
    pub head: Option<MethodExport>,
}

impl RouteModule {
    pub fn empty(id: LoadId, source: &Path) -> Self {
        Self {
            id,
            source: source.to_path_buf(),
            middleware: None,
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            options: None,
            head: None,
        }
    }

    pub fn method(&self, method: HttpMethod) -> Option<&MethodExport> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }

    pub fn method_mut(&mut self, method: HttpMethod) -> &mut Option<MethodExport> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// Exported methods in `HttpMethod::ALL` order.
    pub fn methods(&self) -> impl Iterator<Item = (HttpMethod, &MethodExport)> + '_ {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |m| self.method(m).map(|export| (m, export)))
    }

    pub fn is_empty(&self) -> bool {
        self.methods().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_export_keys() {
        assert_eq!(HttpMethod::from_export("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_export("get"), None);
        assert_eq!(HttpMethod::from_export("middleware"), None);
        assert_eq!(
            HttpMethod::from_middleware_export("DELETE_middleware"),
            Some(HttpMethod::Delete)
        );
        assert_eq!(HttpMethod::from_middleware_export("middleware"), None);
        assert_eq!(HttpMethod::from_middleware_export("GET"), None);
    }

    #[test]
    fn test_methods_iterate_in_fixed_order() {
        let handler = Handler::new("h", || async { "ok" });
        let mut module = RouteModule::empty(LoadId(1), Path::new("route.toml"));
        assert!(module.is_empty());

        for method in [HttpMethod::Head, HttpMethod::Get, HttpMethod::Patch] {
            *module.method_mut(method) = Some(MethodExport {
                handler: handler.clone(),
                middleware: None,
            });
        }

        let methods: Vec<_> = module.methods().map(|(m, _)| m).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Patch, HttpMethod::Head]
        );
        assert!(!module.is_empty());
    }
}
