//! # Resource Module
//!
//! A resource is the handler object bound to one registered path pattern. This
//! module defines the handler contract:
//!
//! - [`Resource`] - lifecycle hooks (`before`/`after`) plus response and error helpers,
//!   implemented by every handler type
//! - [`ResourceContext`] - the principal, request and required-parameter declarations a
//!   handler instance is bound to
//! - [`ResourceType`] - an explicit, per-type table of the methods a handler exposes
//!   (`get`, `getV2`, `accessGet`, ...), with optional deprecation and stability metadata
//! - [`ResourceHandler`] / [`ResourceInstance`] - the type-erased views the dispatcher works with
//!
//! ## Method tables
//!
//! Method names follow the dispatch convention: the lowercase verb (`get`, `post`),
//! optionally suffixed with `V<n>` for a versioned variant (`getV2`). Access checks
//! use `access` (generic) and `access<Verb>` (`accessGet`, `accessPostV3`).
//!
//! ```rust
//! use restapi::resource::{Access, Resource, ResourceContext, ResourceType};
//! use restapi::Response;
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
//! let items = ResourceType::new("items", |ctx| Items { ctx })
//!     .method("get", |r: &mut Items, args| Ok(r.to_json(json!({ "id": args[0] }), 200)))
//!     .method("getV2", |_r: &mut Items, args| Ok(Response::ok(json!({ "item": args[0] }))))
//!     .access("accessGet", |r: &mut Items, _args| Ok(Access::from(r.principal().is_authenticated())))
//!     .deprecated("get", Some(2), Some("Use version 2"))
//!     .into_handler();
//!
//! assert!(items.has_method("getV2"));
//! assert!(items.has_access_check("accessGet"));
//! ```

mod core;
mod table;

pub use self::core::{Access, RequiredParameters, Resource, ResourceContext, Validator};
pub use self::table::{
    Deprecation, MethodMeta, ResourceHandler, ResourceInstance, ResourceType, PRODUCTION,
};
