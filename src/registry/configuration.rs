use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::auth::AuthenticationService;
use crate::error::ConfigError;
use crate::request::JSON_CONTENT_TYPE;
use crate::resource::{Deprecation, ResourceHandler, PRODUCTION};

/// Reserved segment matching any single path segment.
pub const WILDCARD: &str = "%";

/// Raw path that maps to the URL prefix itself.
pub const ROOT: &str = "ROOT";

/// Maximum number of path arguments before heap allocation.
pub const MAX_INLINE_ARGS: usize = 4;

/// Positional path arguments, in pattern order.
pub type PathArgs = SmallVec<[String; MAX_INLINE_ARGS]>;

/// Compute the effective path pattern of a declaration.
///
/// Slashes are trimmed from both sides of the raw path and the prefix. The
/// [`ROOT`] sentinel resolves to the prefix, or `/` without one.
///
/// ```rust
/// use restapi::registry::resolve_effective_path;
///
/// assert_eq!(resolve_effective_path("/to/resource/", Some("/myprefix/")), "myprefix/to/resource");
/// assert_eq!(resolve_effective_path("ROOT", Some("myprefix")), "myprefix");
/// assert_eq!(resolve_effective_path("ROOT", None), "/");
/// ```
#[must_use]
pub fn resolve_effective_path(raw_path: &str, url_prefix: Option<&str>) -> String {
    let path = raw_path.trim().trim_matches('/');
    let prefix = url_prefix
        .map(|p| p.trim().trim_matches('/'))
        .filter(|p| !p.is_empty());

    if path == ROOT {
        return prefix.unwrap_or("/").to_string();
    }
    match prefix {
        Some(prefix) => format!("{prefix}/{path}"),
        None => path.to_string(),
    }
}

/// Normalise an inbound path for matching: slashes trimmed, empty becomes `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Contract of a registered endpoint descriptor.
///
/// [`ResourceConfiguration`] is the default implementation; a declaration may
/// name a custom factory in its `config` field to take over matching and
/// instantiation entirely.
pub trait ResourceConfig: Send + Sync {
    /// Effective path pattern, e.g. `api/items/%`.
    fn path(&self) -> &str;

    /// Owning module label.
    fn module(&self) -> &str;

    fn handler(&self) -> &Arc<dyn ResourceHandler>;

    fn authentication_service(&self) -> &Arc<dyn AuthenticationService>;

    /// Media types that need an explicit version when requested.
    fn versioned_types(&self) -> &[String];

    /// Whether `path` (normalised) matches this pattern.
    fn matches_path(&self, path: &str) -> bool;

    /// Wildcard segment values of `path`, or nothing when it does not match.
    fn arguments_for_path(&self, path: &str) -> PathArgs;

    /// Whether `path` equals the pattern literally.
    fn is_literal_match(&self, path: &str) -> bool {
        self.path() == path
    }

    fn deprecation_for(&self, method: &str) -> Option<Deprecation> {
        self.handler()
            .method_meta(method)
            .and_then(|meta| meta.deprecated.clone())
    }

    /// Stability of `method`; `production` unless declared otherwise.
    fn stability_for(&self, method: &str) -> String {
        self.handler()
            .method_meta(method)
            .and_then(|meta| meta.stability.clone())
            .unwrap_or_else(|| PRODUCTION.to_string())
    }
}

/// Everything needed to build a configuration, with references already
/// resolved against the catalog.
#[derive(Clone)]
pub struct ConfigParts {
    pub raw_path: String,
    pub module: String,
    pub url_prefix: Option<String>,
    pub handler: Arc<dyn ResourceHandler>,
    pub auth: Arc<dyn AuthenticationService>,
}

/// Default, immutable endpoint descriptor.
pub struct ResourceConfiguration {
    path: String,
    module: String,
    handler: Arc<dyn ResourceHandler>,
    auth: Arc<dyn AuthenticationService>,
    versioned_types: Vec<String>,
    matcher: Regex,
    arg_indexes: SmallVec<[usize; MAX_INLINE_ARGS]>,
}

impl fmt::Debug for ResourceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfiguration")
            .field("path", &self.path)
            .field("module", &self.module)
            .field("handler", &self.handler.name())
            .field("versioned_types", &self.versioned_types)
            .field("arg_indexes", &self.arg_indexes)
            .finish()
    }
}

impl ResourceConfiguration {
    /// Resolve the effective path and compile its matcher.
    pub fn new(parts: ConfigParts) -> Result<Self, ConfigError> {
        let path = resolve_effective_path(&parts.raw_path, parts.url_prefix.as_deref());
        let (matcher, arg_indexes) = Self::path_to_regex(&path)?;

        Ok(Self {
            path,
            module: parts.module,
            handler: parts.handler,
            auth: parts.auth,
            versioned_types: vec![JSON_CONTENT_TYPE.to_string()],
            matcher,
            arg_indexes,
        })
    }

    /// Replace the media types that require an explicit version.
    #[must_use]
    pub fn with_versioned_types(mut self, types: Vec<String>) -> Self {
        self.versioned_types = types;
        self
    }

    /// Convert a pattern like `items/%/thing` into `^items/[^/]+/thing$` and
    /// record the segment index of every wildcard.
    pub(crate) fn path_to_regex(
        path: &str,
    ) -> Result<(Regex, SmallVec<[usize; MAX_INLINE_ARGS]>), ConfigError> {
        let mut pattern = String::with_capacity(path.len() + 8);
        let mut indexes = SmallVec::new();
        pattern.push('^');

        if path == "/" {
            pattern.push('/');
        } else {
            for (i, segment) in path.split('/').enumerate() {
                if i > 0 {
                    pattern.push('/');
                }
                if segment == WILDCARD {
                    pattern.push_str("[^/]+");
                    indexes.push(i);
                } else {
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok((regex, indexes))
    }
}

impl ResourceConfig for ResourceConfiguration {
    fn path(&self) -> &str {
        &self.path
    }

    fn module(&self) -> &str {
        &self.module
    }

    fn handler(&self) -> &Arc<dyn ResourceHandler> {
        &self.handler
    }

    fn authentication_service(&self) -> &Arc<dyn AuthenticationService> {
        &self.auth
    }

    fn versioned_types(&self) -> &[String] {
        &self.versioned_types
    }

    fn matches_path(&self, path: &str) -> bool {
        self.path == path || self.matcher.is_match(path)
    }

    fn arguments_for_path(&self, path: &str) -> PathArgs {
        if !self.matches_path(path) {
            return PathArgs::new();
        }
        let segments: SmallVec<[&str; 8]> = path.split('/').collect();
        self.arg_indexes
            .iter()
            .filter_map(|&i| segments.get(i).map(|s| (*s).to_string()))
            .collect()
    }
}
