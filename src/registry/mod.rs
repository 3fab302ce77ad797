//! # Registry Module
//!
//! The registry maps inbound paths onto registered endpoints. It is built once
//! at boot from an ordered list of [`ResourceDeclaration`]s and is read-only
//! afterwards, so concurrent dispatches can share it without locking.
//!
//! ## Path patterns
//!
//! A pattern is a slash-separated template where `%` matches exactly one
//! segment. Patterns are compiled into anchored regexes at construction time
//! (`items/%/thing` becomes `^items/[^/]+/thing$`) and the position of each
//! wildcard is cached, so matching and argument extraction never mutate the
//! configuration.
//!
//! ## Bootstrap
//!
//! Declarations name their handler type, authentication service and optional
//! custom configuration factory. Names are resolved against a [`Catalog`];
//! an unknown name is a [`ConfigError`](crate::error::ConfigError) that aborts
//! the build.
//!
//! ```rust
//! use restapi::config::ApiConfig;
//! use restapi::echo::EchoResource;
//! use restapi::registry::{Catalog, ResourceDeclaration, ResourceRegistry};
//!
//! let mut catalog = Catalog::new();
//! catalog.register_resource(EchoResource::handler("items"));
//!
//! let settings = ApiConfig {
//!     url_prefix: Some("api".into()),
//!     ..ApiConfig::default()
//! };
//! let registry = ResourceRegistry::build(
//!     &[ResourceDeclaration::new("items/%", "items")],
//!     &catalog,
//!     &settings,
//! )?;
//!
//! let config = registry.lookup("/api/items/42").expect("registered");
//! assert_eq!(config.path(), "api/items/%");
//! assert_eq!(config.arguments_for_path("api/items/42").as_slice(), ["42"]);
//! # Ok::<(), restapi::error::ConfigError>(())
//! ```

mod catalog;
mod configuration;
mod core;
#[cfg(test)]
mod tests;

pub use self::catalog::{Catalog, ConfigFactory, ALLOW_ALL_AUTH};
pub use self::configuration::{
    normalize_path, resolve_effective_path, ConfigParts, PathArgs, ResourceConfig,
    ResourceConfiguration, MAX_INLINE_ARGS, ROOT, WILDCARD,
};
pub use self::core::{Declarations, ResourceDeclaration, ResourceRegistry};
