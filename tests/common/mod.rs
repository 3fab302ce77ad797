#![allow(dead_code)]

//! Fixture resources and `Api` builders shared by the integration tests.

use restapi::config::ApiConfig;
use restapi::registry::{Catalog, ResourceDeclaration, ResourceRegistry};
use restapi::resource::{Access, Resource, ResourceContext, ResourceHandler, ResourceType};
use restapi::{Api, ApiError, Params, Response};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Names of the business methods and access checks a fixture ran, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

/// Plain handler struct for fixtures without lifecycle overrides.
pub struct Fixture {
    ctx: ResourceContext,
}

impl Fixture {
    pub fn new(ctx: ResourceContext) -> Self {
        Self { ctx }
    }
}

impl Resource for Fixture {
    fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ResourceContext {
        &mut self.ctx
    }
}

/// `items`: `get` answers `{ id, name: "widget" }` and records its arguments.
pub fn items_handler(log: &CallLog) -> Arc<dyn ResourceHandler> {
    let get_log = Arc::clone(log);
    let delete_log = Arc::clone(log);
    ResourceType::new("items", |ctx| Fixture { ctx })
        .method("get", move |_r: &mut Fixture, args| {
            get_log.lock().unwrap().push(format!("get:{}", args.join("/")));
            let id = args.first().cloned().unwrap_or_default();
            Ok(Response::ok(json!({ "id": id, "name": "widget" })))
        })
        .method("delete", move |r: &mut Fixture, args| {
            delete_log.lock().unwrap().push(format!("delete:{}", args.join("/")));
            Ok(r.to_json(Value::Null, 204))
        })
        .into_handler()
}

/// `versioned`: `get`, `getV1` and `getV2`, each answering with its own name.
pub fn versioned_handler() -> Arc<dyn ResourceHandler> {
    ["get", "getV1", "getV2"]
        .into_iter()
        .fold(
            ResourceType::new("versioned", |ctx| Fixture { ctx }),
            |table, name| {
                table.method(name, move |_r: &mut Fixture, _args| {
                    Ok(Response::ok(json!({ "method": name })))
                })
            },
        )
        .into_handler()
}

/// `guarded`: `get` and `post`, behind a generic `access` check answering
/// `generic` and an `accessPost` check answering `post`.
pub fn guarded_handler(log: &CallLog, generic: Access, post: Access) -> Arc<dyn ResourceHandler> {
    let (get_log, post_log, access_log, post_access_log) = (
        Arc::clone(log),
        Arc::clone(log),
        Arc::clone(log),
        Arc::clone(log),
    );
    ResourceType::new("guarded", |ctx| Fixture { ctx })
        .method("get", move |_r: &mut Fixture, _args| {
            get_log.lock().unwrap().push("get".to_string());
            Ok(Response::ok(json!({ "secret": true })))
        })
        .method("post", move |_r: &mut Fixture, _args| {
            post_log.lock().unwrap().push("post".to_string());
            Ok(Response::json(201, json!({ "created": true })))
        })
        .access("access", move |_r: &mut Fixture, _args| {
            access_log.lock().unwrap().push("access".to_string());
            Ok(generic.clone())
        })
        .access("accessPost", move |_r: &mut Fixture, _args| {
            post_access_log.lock().unwrap().push("accessPost".to_string());
            Ok(post.clone())
        })
        .into_handler()
}

/// Declares `q` and a numeric `limit` as required in `before`.
pub struct Search {
    ctx: ResourceContext,
}

impl Resource for Search {
    fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ResourceContext {
        &mut self.ctx
    }

    fn before(&mut self) -> Result<(), ApiError> {
        self.require_parameter("q");
        self.require_parameter_with("limit", |v| {
            v.as_str().map(|s| s.parse::<u32>().is_ok()).unwrap_or(false)
        });
        Ok(())
    }
}

pub fn search_handler() -> Arc<dyn ResourceHandler> {
    ResourceType::new("search", |ctx| Search { ctx })
        .method("get", |r: &mut Search, _args| {
            let q = r.request().param("q").cloned().unwrap_or(Value::Null);
            Ok(Response::ok(json!({ "q": q })))
        })
        .into_handler()
}

/// `faulty`: `get` panics, `post` fails with `409 conflict`.
pub fn faulty_handler() -> Arc<dyn ResourceHandler> {
    ResourceType::new("faulty", |ctx| Fixture { ctx })
        .method("get", |_r: &mut Fixture, _args| -> Result<Response, ApiError> {
            panic!("database exploded")
        })
        .method("post", |_r: &mut Fixture, _args| {
            Err(ApiError::custom(409, "conflict", "Already exists"))
        })
        .into_handler()
}

/// Wraps the business response in `after` when `wrap` is set, fails in
/// `after` when `fail` is set.
pub struct Wrapped {
    ctx: ResourceContext,
}

impl Resource for Wrapped {
    fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ResourceContext {
        &mut self.ctx
    }

    fn after(&mut self, response: &Response) -> Result<Option<Response>, ApiError> {
        if self.request().param("fail").is_some() {
            return Err(ApiError::custom(502, "upstream", "Post-processing failed"));
        }
        if self.request().param("wrap").is_some() {
            return Ok(Some(Response::ok(json!({ "wrapped": response.body }))));
        }
        Ok(None)
    }
}

pub fn wrapped_handler() -> Arc<dyn ResourceHandler> {
    ResourceType::new("wrapped", |ctx| Wrapped { ctx })
        .method("get", |_r: &mut Wrapped, _args| Ok(Response::ok(json!({ "value": 1 }))))
        .into_handler()
}

/// Build an `Api` serving `routes` (`(path, handler)`) from `handlers`, without hooks.
pub fn build_api(
    handlers: Vec<Arc<dyn ResourceHandler>>,
    routes: &[(&str, &str)],
    config: ApiConfig,
) -> Api {
    let mut catalog = Catalog::new();
    for handler in handlers {
        catalog.register_resource(handler);
    }
    let declarations: Vec<ResourceDeclaration> = routes
        .iter()
        .map(|(path, handler)| ResourceDeclaration::new(*path, *handler))
        .collect();
    let registry = ResourceRegistry::build(&declarations, &catalog, &config).unwrap();
    Api::new(Arc::new(registry), config)
}

/// `items/%` on [`items_handler`] with default settings.
pub fn items_api(log: &CallLog) -> Api {
    build_api(
        vec![items_handler(log)],
        &[("items/%", "items")],
        ApiConfig::default(),
    )
}

/// `versioned` on [`versioned_handler`] with the given version ceiling.
pub fn versioned_api(current_version: u32) -> Api {
    let config = ApiConfig {
        current_version,
        ..ApiConfig::default()
    };
    build_api(vec![versioned_handler()], &[("versioned", "versioned")], config)
}

pub fn accept_version(version: u32) -> String {
    format!("application/json; version={version}")
}
