//! # Configuration Module
//!
//! Process-wide dispatcher settings ([`ApiConfig`]) and the declaration file
//! that lists the resources to register.
//!
//! ## Sources
//!
//! Lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. the `settings` table of a declaration file
//! 3. environment variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `RESTAPI_CURRENT_VERSION` | `current_version` | `1` |
//! | `RESTAPI_REQUIRE_VERSION` | `require_version` | `false` |
//! | `RESTAPI_URL_PREFIX` | `url_prefix` | none |
//! | `RESTAPI_DEFAULT_AUTH` | `default_auth` | `permission` |
//!
//! ## Declaration files
//!
//! YAML (`.yaml`, `.yml`), JSON (`.json`) and TOML (`.toml`) are accepted.
//! The `resources` mapping is registered in document order:
//!
//! ```yaml
//! settings:
//!   current_version: 3
//!   url_prefix: api
//! resources:
//!   items/%:
//!     handler: items
//!     module: inventory
//!   ROOT:
//!     handler: index
//!     auth: allow_all
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::auth::DEFAULT_AUTH;
use crate::registry::Declarations;

/// Default server-wide version ceiling.
pub const DEFAULT_CURRENT_VERSION: u32 = 1;

/// Upper bound for `current_version`. The method cascade walks every version
/// below the ceiling, so it has to stay small.
pub const MAX_CURRENT_VERSION: u32 = 1000;

/// Dispatcher settings, read-only once the [`Api`](crate::dispatcher::Api) is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Highest API version served; requests for newer versions are capped here
    pub current_version: u32,
    /// Reject versioned media types requested without an explicit version
    pub require_version: bool,
    /// Prepended to every registered path pattern
    pub url_prefix: Option<String>,
    /// Authentication service for declarations that name none
    pub default_auth: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            current_version: DEFAULT_CURRENT_VERSION,
            require_version: false,
            url_prefix: None,
            default_auth: DEFAULT_AUTH.to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ApiConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply environment-variable overrides on top of `self`.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Apply overrides read through `get`, keyed by environment-variable name.
    #[must_use]
    pub fn apply_vars<F>(mut self, get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = get("RESTAPI_CURRENT_VERSION") {
            self.current_version = match raw.trim().parse::<u32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    warn!(value = %raw, "Invalid RESTAPI_CURRENT_VERSION, using default");
                    DEFAULT_CURRENT_VERSION
                }
            };
        }
        if let Some(raw) = get("RESTAPI_REQUIRE_VERSION") {
            match parse_bool(&raw) {
                Some(v) => self.require_version = v,
                None => warn!(value = %raw, "Invalid RESTAPI_REQUIRE_VERSION, ignoring"),
            }
        }
        if let Some(prefix) = get("RESTAPI_URL_PREFIX") {
            self.url_prefix = Some(prefix).filter(|p| !p.trim_matches('/').trim().is_empty());
        }
        if let Some(auth) = get("RESTAPI_DEFAULT_AUTH").filter(|a| !a.trim().is_empty()) {
            self.default_auth = auth.trim().to_string();
        }
        self.normalized()
    }

    /// Replace a zero version with the default and cap it at [`MAX_CURRENT_VERSION`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.current_version == 0 {
            self.current_version = DEFAULT_CURRENT_VERSION;
        } else if self.current_version > MAX_CURRENT_VERSION {
            warn!(
                current_version = self.current_version,
                max = MAX_CURRENT_VERSION,
                "current_version above the supported maximum, capping"
            );
            self.current_version = MAX_CURRENT_VERSION;
        }
        self
    }
}

/// Contents of a declaration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeclarationFile {
    pub settings: ApiConfig,
    pub resources: Declarations,
}

/// Load a declaration file, choosing the format from the extension.
///
/// The returned settings are normalised but do not include environment
/// overrides; apply [`ApiConfig::with_env`] for those.
pub fn load_declarations(path: &Path) -> Result<DeclarationFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read declaration file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut file: DeclarationFile = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        "toml" => toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        other => bail!(
            "Unsupported declaration file extension {:?} for {}",
            other,
            path.display()
        ),
    };
    file.settings = file.settings.normalized();

    info!(
        path = %path.display(),
        resources_count = file.resources.0.len(),
        current_version = file.settings.current_version,
        "Declaration file loaded"
    );
    Ok(file)
}
