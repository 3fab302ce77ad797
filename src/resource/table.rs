use std::collections::HashMap;
use std::sync::Arc;

use super::core::{Access, Resource, ResourceContext};
use crate::error::ApiError;
use crate::principal::Principal;
use crate::request::Request;
use crate::response::Response;

/// Stability reported for methods without explicit stability metadata.
pub const PRODUCTION: &str = "production";

type MethodFn<R> = Arc<dyn Fn(&mut R, &[String]) -> Result<Response, ApiError> + Send + Sync>;
type AccessFn<R> = Arc<dyn Fn(&mut R, &[String]) -> Result<Access, ApiError> + Send + Sync>;
type Constructor<R> = Arc<dyn Fn(ResourceContext) -> R + Send + Sync>;

/// Deprecation notice attached to a handler method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deprecation {
    /// API version the method was deprecated in
    pub version: Option<u32>,
    /// Why, or what to use instead
    pub reason: Option<String>,
}

/// Declarative metadata for one handler method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodMeta {
    pub deprecated: Option<Deprecation>,
    pub stability: Option<String>,
}

/// Type-erased view of a handler type, as stored in resource configurations.
pub trait ResourceHandler: Send + Sync {
    /// Registered name of the handler type.
    fn name(&self) -> &str;

    /// Whether a business method with exactly this name exists.
    fn has_method(&self, name: &str) -> bool;

    /// Whether an access check with exactly this name exists.
    fn has_access_check(&self, name: &str) -> bool;

    /// Names of all business methods, sorted.
    fn method_names(&self) -> Vec<String>;

    fn method_meta(&self, name: &str) -> Option<&MethodMeta>;

    /// Construct a handler instance bound to a principal and request.
    fn instantiate(&self, principal: Principal, request: Request) -> Box<dyn ResourceInstance>;
}

/// Type-erased handler instance, alive for one call.
pub trait ResourceInstance {
    fn context(&self) -> &ResourceContext;

    fn before(&mut self) -> Result<(), ApiError>;

    fn after(&mut self, response: &Response) -> Result<Option<Response>, ApiError>;

    /// Run a business method. Unknown names fail with `NotAllowed`.
    fn invoke(&mut self, method: &str, args: &[String]) -> Result<Response, ApiError>;

    /// Run an access check. Unknown names grant access.
    fn check_access(&mut self, name: &str, args: &[String]) -> Result<Access, ApiError>;
}

struct Tables<R> {
    methods: HashMap<String, MethodFn<R>>,
    access: HashMap<String, AccessFn<R>>,
    meta: HashMap<String, MethodMeta>,
}

/// Builder for the explicit method table of a handler type `R`.
///
/// The table is built once at registration time; dispatch only ever looks names
/// up in it.
pub struct ResourceType<R> {
    name: String,
    construct: Constructor<R>,
    tables: Tables<R>,
}

impl<R: Resource> ResourceType<R> {
    pub fn new<F>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(ResourceContext) -> R + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            construct: Arc::new(construct),
            tables: Tables {
                methods: HashMap::new(),
                access: HashMap::new(),
                meta: HashMap::new(),
            },
        }
    }

    /// Register a business method (`get`, `postV2`, ...). Path arguments are
    /// passed positionally in pattern order.
    #[must_use]
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut R, &[String]) -> Result<Response, ApiError> + Send + Sync + 'static,
    {
        self.tables.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Register an access check (`access`, `accessGet`, `accessPutV2`, ...).
    #[must_use]
    pub fn access<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut R, &[String]) -> Result<Access, ApiError> + Send + Sync + 'static,
    {
        self.tables.access.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Mark a method deprecated. Either field may be omitted.
    #[must_use]
    pub fn deprecated(mut self, method: &str, version: Option<u32>, reason: Option<&str>) -> Self {
        self.tables.meta.entry(method.to_string()).or_default().deprecated = Some(Deprecation {
            version,
            reason: reason.map(str::to_string),
        });
        self
    }

    /// Record the stability of a method (`prototype`, `beta`, ...).
    #[must_use]
    pub fn stability(mut self, method: &str, stability: &str) -> Self {
        self.tables.meta.entry(method.to_string()).or_default().stability =
            Some(stability.to_string());
        self
    }

    /// Finish the table and erase the handler type.
    #[must_use]
    pub fn into_handler(self) -> Arc<dyn ResourceHandler> {
        Arc::new(TypedHandler {
            name: self.name,
            construct: self.construct,
            tables: Arc::new(self.tables),
        })
    }
}

struct TypedHandler<R> {
    name: String,
    construct: Constructor<R>,
    tables: Arc<Tables<R>>,
}

impl<R: Resource> ResourceHandler for TypedHandler<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_method(&self, name: &str) -> bool {
        self.tables.methods.contains_key(name)
    }

    fn has_access_check(&self, name: &str) -> bool {
        self.tables.access.contains_key(name)
    }

    fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.methods.keys().cloned().collect();
        names.sort();
        names
    }

    fn method_meta(&self, name: &str) -> Option<&MethodMeta> {
        self.tables.meta.get(name)
    }

    fn instantiate(&self, principal: Principal, request: Request) -> Box<dyn ResourceInstance> {
        let resource = (self.construct)(ResourceContext::new(principal, request));
        Box::new(BoundResource {
            resource,
            tables: Arc::clone(&self.tables),
        })
    }
}

struct BoundResource<R> {
    resource: R,
    tables: Arc<Tables<R>>,
}

impl<R: Resource> ResourceInstance for BoundResource<R> {
    fn context(&self) -> &ResourceContext {
        self.resource.context()
    }

    fn before(&mut self) -> Result<(), ApiError> {
        self.resource.before()
    }

    fn after(&mut self, response: &Response) -> Result<Option<Response>, ApiError> {
        self.resource.after(response)
    }

    fn invoke(&mut self, method: &str, args: &[String]) -> Result<Response, ApiError> {
        let f = self.tables.methods.get(method).ok_or_else(|| {
            ApiError::NotAllowed(format!("The method \"{method}\" is not available."))
        })?;
        f(&mut self.resource, args)
    }

    fn check_access(&mut self, name: &str, args: &[String]) -> Result<Access, ApiError> {
        match self.tables.access.get(name) {
            Some(f) => f(&mut self.resource, args),
            None => Ok(Access::Granted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter {
        ctx: ResourceContext,
        calls: usize,
    }

    impl Resource for Counter {
        fn context(&self) -> &ResourceContext {
            &self.ctx
        }
        fn context_mut(&mut self) -> &mut ResourceContext {
            &mut self.ctx
        }
    }

    fn handler() -> Arc<dyn ResourceHandler> {
        ResourceType::new("counter", |ctx| Counter { ctx, calls: 0 })
            .method("get", |r: &mut Counter, args| {
                r.calls += 1;
                Ok(Response::ok(json!({ "args": args, "calls": r.calls })))
            })
            .access("accessGet", |_r: &mut Counter, _args| Ok(Access::Denied))
            .stability("get", "beta")
            .deprecated("get", None, Some("old"))
            .into_handler()
    }

    #[test]
    fn test_table_lookups() {
        let h = handler();
        assert_eq!(h.name(), "counter");
        assert!(h.has_method("get"));
        assert!(!h.has_method("post"));
        assert!(h.has_access_check("accessGet"));
        assert!(!h.has_access_check("access"));
        assert_eq!(h.method_names(), vec!["get".to_string()]);

        let meta = h.method_meta("get").unwrap();
        assert_eq!(meta.stability.as_deref(), Some("beta"));
        assert_eq!(
            meta.deprecated,
            Some(Deprecation {
                version: None,
                reason: Some("old".into())
            })
        );
    }

    #[test]
    fn test_instance_invocation() {
        let h = handler();
        let mut inst = h.instantiate(Principal::anonymous(), Request::default());
        let resp = inst.invoke("get", &["42".to_string()]).unwrap();
        assert_eq!(resp.body, json!({ "args": ["42"], "calls": 1 }));

        let err = inst.invoke("post", &[]).unwrap_err();
        assert_eq!(err.code(), "not_allowed");

        assert_eq!(inst.check_access("accessGet", &[]).unwrap(), Access::Denied);
        assert_eq!(inst.check_access("access", &[]).unwrap(), Access::Granted);
    }
}
