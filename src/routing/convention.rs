//! File naming convention.
//!
//! A directory may contain a route manifest (`route.<ext>`) and a scope
//! middleware manifest (`parentMiddleware.<ext>`). Names must match
//! verbatim: `Route.toml` or `route.old.toml` are ignored.

use crate::config::RoutesConfig;

/// Kind of convention file found in a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConventionFile {
    Route,
    ScopeMiddleware,
}

/// Recognizes convention file names.
#[derive(Debug, Clone)]
pub struct FileConvention {
    route_stem: String,
    middleware_stem: String,
    extensions: Vec<String>,
}

impl FileConvention {
    pub fn new(
        route_stem: impl Into<String>,
        middleware_stem: impl Into<String>,
        extensions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            route_stem: route_stem.into(),
            middleware_stem: middleware_stem.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &RoutesConfig) -> Self {
        Self::new(
            config.route_file.clone(),
            config.middleware_file.clone(),
            config.extensions.iter().cloned(),
        )
    }

    /// Classify a bare file name.
    pub fn classify(&self, file_name: &str) -> Option<ConventionFile> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if !self.extensions.iter().any(|e| e == ext) {
            return None;
        }

        if stem == self.route_stem {
            Some(ConventionFile::Route)
        } else if stem == self.middleware_stem {
            Some(ConventionFile::ScopeMiddleware)
        } else {
            None
        }
    }
}

impl Default for FileConvention {
    fn default() -> Self {
        Self::from_config(&RoutesConfig::default())
    }
}
