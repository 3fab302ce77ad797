//! # Dispatcher Module
//!
//! [`Api`] owns the call lifecycle. A call runs synchronously on the caller's
//! thread and always yields a [`Response`](crate::Response); failures never
//! escape as errors or panics.
//!
//! ## Call lifecycle
//!
//! 1. Resolve the resource configuration for the path (`404 not_found` on a miss)
//! 2. Derive the call-scoped request from the ambient one: method, merged data, path, headers
//! 3. Version gate (`400 missing_version`, only with `require_version`)
//! 4. Resolve the versioned method (`405 not_allowed` on a miss; OPTIONS falls back to the built-in answer)
//! 5. Pre-request hooks, in registration order
//! 6. Instantiate the handler, run `before()`
//! 7. Required-parameter validation (`400 missing_parameters` / `invalid_parameters`)
//! 8. Access checks: generic `access`, then the versioned `access<Verb>` (`403 unauthorized`)
//! 9. Invoke the method with the wildcard arguments, in pattern order
//! 10. `after()`, which may replace the response
//! 11. On failure: exception hooks, else the default error envelope
//! 12. Post-response hooks, in registration order
//!
//! Steps 5 to 10 run under `catch_unwind`; a panicking handler or pre-request
//! hook becomes a `500 system` response, and the post-response hooks still see
//! the caller's request. Each exception and post-response hook is guarded on
//! its own: a panic there is logged and treated as "no replacement".
//!
//! Step 8 and the built-in OPTIONS answer use the verb and version resolved in
//! step 4, so a pre-request hook cannot move a call onto another verb's checks.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use restapi::config::ApiConfig;
//! use restapi::echo::EchoResource;
//! use restapi::registry::{Catalog, ResourceDeclaration, ResourceRegistry};
//! use restapi::{Api, Params};
//!
//! let mut catalog = Catalog::new();
//! catalog.register_resource(EchoResource::handler("items"));
//! let registry = ResourceRegistry::build(
//!     &[ResourceDeclaration::new("items/%", "items")],
//!     &catalog,
//!     &ApiConfig::default(),
//! )?;
//!
//! let api = Api::new(Arc::new(registry), ApiConfig::default());
//!
//! let res = api.call("GET", "items/42", Params::new(), &[]);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["args"][0], "42");
//!
//! let res = api.call("GET", "unknown/path", Params::new(), &[]);
//! assert_eq!(res.status, 404);
//! assert_eq!(res.body["error"], "not_found");
//! # Ok::<(), restapi::error::ConfigError>(())
//! ```

mod core;

pub use self::core::{Api, SubCall, MISSING_VERSION_MESSAGE, UNAUTHORIZED_MESSAGE};
