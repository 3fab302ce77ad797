//! # restapi
//!
//! **restapi** is the control plane of a REST layer embedded in a host
//! application. It maps an HTTP-style call (method, path, data, headers) onto a
//! registered resource handler, after resolving the API version, the handler
//! method, required parameters and access checks, with pluggable hooks before
//! and after every call.
//!
//! ## Architecture
//!
//! - **[`registry`]** - path patterns (`items/%`) and the read-only registry built at boot
//! - **[`resource`]** - the handler contract and per-type method tables
//! - **[`versioning`]** - the version cascade (`getV3` -> `getV2` -> `get`)
//! - **[`dispatcher`]** - [`Api`], which owns the call lifecycle
//! - **[`hooks`]** - pre-request, post-response and exception-mapping extension points
//! - **[`request`]** / **[`response`]** - immutable request and response values
//! - **[`error`]** - the error taxonomy rendered as `{ "error": <code>, "message": <message> }`
//! - **[`auth`]** / **[`principal`]** - authentication services and the acting user
//! - **[`config`]** / **[`logging`]** - settings, declaration files and tracing setup
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use restapi::config::ApiConfig;
//! use restapi::registry::{Catalog, ResourceDeclaration, ResourceRegistry};
//! use restapi::resource::{Resource, ResourceContext, ResourceType};
//! use restapi::{Api, Params, Response};
//! use serde_json::json;
//!
//! struct Items {
//!     ctx: ResourceContext,
//! }
//!
//! impl Resource for Items {
//!     fn context(&self) -> &ResourceContext {
//!         &self.ctx
//!     }
//!     fn context_mut(&mut self) -> &mut ResourceContext {
//!         &mut self.ctx
//!     }
//! }
//!
//! let mut catalog = Catalog::new();
//! catalog.register_resource(
//!     ResourceType::new("items", |ctx| Items { ctx })
//!         .method("get", |_r: &mut Items, args| {
//!             Ok(Response::ok(json!({ "id": args[0], "name": "widget" })))
//!         })
//!         .into_handler(),
//! );
//!
//! let registry = ResourceRegistry::build(
//!     &[ResourceDeclaration::new("items/%", "items")],
//!     &catalog,
//!     &ApiConfig::default(),
//! )?;
//! let api = Api::new(Arc::new(registry), ApiConfig::default()).with_builtin_hooks();
//!
//! let res = api.call("GET", "items/42", Params::new(), &[]);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body, json!({ "id": "42", "name": "widget" }));
//!
//! let res = api.call("POST", "items/42", Params::new(), &[]);
//! assert_eq!(res.status, 405);
//! assert_eq!(res.body["error"], "not_allowed");
//! # Ok::<(), restapi::error::ConfigError>(())
//! ```
//!
//! ## Concurrency
//!
//! A call runs synchronously on the caller's thread. The registry and the
//! [`Api`] are read-only during dispatch, so one instance can be shared across
//! threads behind an `Arc`.

pub mod auth;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod hooks;
pub mod ids;
pub mod logging;
pub mod principal;
pub mod registry;
pub mod request;
pub mod resource;
pub mod response;
pub mod versioning;

pub use dispatcher::{Api, SubCall};
pub use error::{ApiError, ConfigError};
pub use ids::RequestId;
pub use principal::Principal;
pub use request::{Params, Request};
pub use response::Response;
