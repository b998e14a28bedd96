//! Directory segments to URL path patterns.
//!
//! # Responsibilities
//! - Elide one trailing `index` segment
//! - Classify `[name]` as a parameter and `[...name]` as a catch-all
//! - Render the canonical (`/api/users/:id`) and axum (`/api/users/{id}`) forms
//!
//! # Design Decisions
//! - Pure: the same segments and prefix always produce the same path
//! - Only whole-segment brackets are parameters; `v[2]` stays literal
//! - Names axum would read as its own syntax (`:id`, `*x`, `{id}`) are
//!   rejected rather than escaped
//! - Parameter names are ignored when comparing route shapes, so
//!   `/users/:id` and `/users/:name` collide

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

const INDEX_SEGMENT: &str = "index";

/// Reasons a directory tree cannot be expressed as a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("segment '{0}' declares a parameter without a name")]
    EmptyParam(String),

    #[error("catch-all segment '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("parameter '{0}' is declared more than once")]
    DuplicateParam(String),

    #[error("segment '{0}' uses characters reserved by the router")]
    ReservedSyntax(String),
}

/// One component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    /// Classify a raw directory name.
    fn parse(raw: &str) -> Result<Self, PathError> {
        let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
            if raw.starts_with([':', '*']) || raw.contains(['{', '}']) {
                return Err(PathError::ReservedSyntax(raw.to_string()));
            }
            return Ok(Segment::Static(raw.to_string()));
        };

        let (name, catch_all) = match inner.strip_prefix("...") {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if name.is_empty() {
            return Err(PathError::EmptyParam(raw.to_string()));
        }
        // Parameter names end up inside `{...}` in the axum pattern.
        if name.contains(['{', '}', ':', '*']) {
            return Err(PathError::ReservedSyntax(raw.to_string()));
        }

        if catch_all {
            Ok(Segment::CatchAll(name.to_string()))
        } else {
            Ok(Segment::Param(name.to_string()))
        }
    }

    fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

/// A resolved URL path pattern for one route manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePath {
    prefix: String,
    segments: Vec<Segment>,
}

impl RoutePath {
    /// Resolve a route path from the directory names between the base
    /// directory and the manifest, outermost first.
    pub fn resolve<S: AsRef<str>>(prefix: &str, raw_segments: &[S]) -> Result<Self, PathError> {
        let mut raw: Vec<&str> = raw_segments.iter().map(AsRef::as_ref).collect();
        if raw.last() == Some(&INDEX_SEGMENT) {
            raw.pop();
        }

        let mut segments = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();
        let last = raw.len().saturating_sub(1);

        for (i, part) in raw.iter().enumerate() {
            let segment = Segment::parse(part)?;
            if matches!(segment, Segment::CatchAll(_)) && i != last {
                return Err(PathError::CatchAllNotLast((*part).to_string()));
            }
            if let Some(name) = segment.param_name() {
                if !seen.insert(name.to_string()) {
                    return Err(PathError::DuplicateParam(name.to_string()));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            prefix: normalize_prefix(prefix),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the path parameters, in order.
    pub fn params(&self) -> Vec<&str> {
        self.segments.iter().filter_map(Segment::param_name).collect()
    }

    /// Canonical pattern, e.g. `/api/users/:id`.
    pub fn pattern(&self) -> String {
        self.render(|segment| match segment {
            Segment::Static(s) => s.clone(),
            Segment::Param(name) => format!(":{name}"),
            Segment::CatchAll(name) => format!("*{name}"),
        })
    }

    /// Pattern in axum's syntax, e.g. `/api/users/{id}`.
    pub fn axum_pattern(&self) -> String {
        self.render(|segment| match segment {
            Segment::Static(s) => s.clone(),
            Segment::Param(name) => format!("{{{name}}}"),
            Segment::CatchAll(name) => format!("{{*{name}}}"),
        })
    }

    /// Pattern with parameter names erased. Two routes with the same shape
    /// cannot both be installed.
    pub fn shape(&self) -> String {
        self.render(|segment| match segment {
            Segment::Static(s) => s.clone(),
            Segment::Param(_) => "{}".to_string(),
            Segment::CatchAll(_) => "{*}".to_string(),
        })
    }

    fn render(&self, f: impl Fn(&Segment) -> String) -> String {
        if self.segments.is_empty() {
            return if self.prefix.is_empty() {
                "/".to_string()
            } else {
                self.prefix.clone()
            };
        }

        let mut out = self.prefix.clone();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&f(segment));
        }
        out
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(segments: &[&str]) -> String {
        RoutePath::resolve("/api", segments).unwrap().pattern()
    }

    #[test]
    fn test_bracket_becomes_param() {
        assert_eq!(pattern(&["users", "[id]"]), "/api/users/:id");
        assert_eq!(
            RoutePath::resolve("/api", &["users", "[id]"])
                .unwrap()
                .axum_pattern(),
            "/api/users/{id}"
        );
    }

    #[test]
    fn test_trailing_index_is_elided() {
        assert_eq!(pattern(&["users", "index"]), "/api/users");
        assert_eq!(pattern(&["index"]), "/api");
        // Only the final segment, and only once.
        assert_eq!(pattern(&["index", "users"]), "/api/index/users");
        assert_eq!(pattern(&["index", "index"]), "/api/index");
    }

    #[test]
    fn test_root_mounts_at_prefix() {
        let empty: [&str; 0] = [];
        assert_eq!(pattern(&empty), "/api");
        assert_eq!(RoutePath::resolve("", &empty).unwrap().pattern(), "/");
        assert_eq!(RoutePath::resolve("/v1/", &["a"]).unwrap().pattern(), "/v1/a");
        assert_eq!(RoutePath::resolve("v1", &["a"]).unwrap().pattern(), "/v1/a");
    }

    #[test]
    fn test_catch_all() {
        let path = RoutePath::resolve("/api", &["docs", "[...slug]"]).unwrap();
        assert_eq!(path.pattern(), "/api/docs/*slug");
        assert_eq!(path.axum_pattern(), "/api/docs/{*slug}");
        assert_eq!(path.params(), vec!["slug"]);

        assert_eq!(
            RoutePath::resolve("/api", &["[...slug]", "edit"]),
            Err(PathError::CatchAllNotLast("[...slug]".into()))
        );
    }

    #[test]
    fn test_invalid_params() {
        assert_eq!(
            RoutePath::resolve("/api", &["[]"]),
            Err(PathError::EmptyParam("[]".into()))
        );
        assert_eq!(
            RoutePath::resolve("/api", &["[...]"]),
            Err(PathError::EmptyParam("[...]".into()))
        );
        assert_eq!(
            RoutePath::resolve("/api", &["[id]", "posts", "[id]"]),
            Err(PathError::DuplicateParam("id".into()))
        );
    }

    #[test]
    fn test_router_syntax_is_rejected() {
        for raw in [":id", "*x", "{id}", "a{b", "a}b", "[a}b]", "[...*x]", "[:id]"] {
            assert_eq!(
                RoutePath::resolve("/api", &["users", raw]),
                Err(PathError::ReservedSyntax(raw.into())),
                "{raw}"
            );
        }
        // Reserved characters are fine away from the start of a segment.
        assert_eq!(pattern(&["a:b", "c*d"]), "/api/a:b/c*d");
    }

    #[test]
    fn test_partial_brackets_stay_literal() {
        assert_eq!(pattern(&["v[2]"]), "/api/v[2]");
    }

    #[test]
    fn test_shape_ignores_param_names() {
        let a = RoutePath::resolve("/api", &["users", "[id]"]).unwrap();
        let b = RoutePath::resolve("/api", &["users", "[name]"]).unwrap();
        assert_ne!(a.pattern(), b.pattern());
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn test_index_elided_before_param_parsing() {
        assert_eq!(pattern(&["[index]"]), "/api/:index");
    }
}
