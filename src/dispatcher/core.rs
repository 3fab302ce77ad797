use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, SYSTEM_CODE};
use crate::hooks::{DeprecationHook, Hook, RequestIdHook, TracingHook};
use crate::principal::Principal;
use crate::registry::{normalize_path, ResourceConfig, ResourceRegistry};
use crate::request::{parse_method, Params, Request};
use crate::resource::{Access, ResourceInstance};
use crate::response::Response;
use crate::versioning::{allowed_methods, resolve_access_check, resolve_method, GENERIC_ACCESS};

/// Message of the `unauthorized` error raised by a failed access check.
pub const UNAUTHORIZED_MESSAGE: &str = "You do not have permission to access this resource.";

/// Message of the `missing_version` error.
pub const MISSING_VERSION_MESSAGE: &str = "Missing required API version number.";

/// One entry of [`Api::call_multiple`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubCall {
    pub method: String,
    pub path: String,
    pub data: Params,
    pub headers: Vec<(String, String)>,
}

impl SubCall {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Params) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// What a resolved call runs.
enum Target {
    /// A business method from the handler's table
    Method(String),
    /// The built-in OPTIONS answer
    Options,
}

/// What step 2 resolved from the caller's request, before any hook ran.
struct Resolved<'a> {
    target: Target,
    verb: &'a str,
    version: u32,
}

/// A failed lifecycle, with the response built before the failure, if any.
struct Failure {
    error: ApiError,
    response: Option<Response>,
}

impl From<ApiError> for Failure {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs one post-response or exception hook. A panic counts as "no replacement".
fn guard_hook<T>(index: usize, stage: &'static str, call: impl FnOnce() -> Option<T>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(replaced) => replaced,
        Err(payload) => {
            error!(
                hook_index = index,
                stage = stage,
                panic_message = %panic_message(payload.as_ref()),
                "Hook panicked - CRITICAL"
            );
            None
        }
    }
}

fn access_failure(access: Access) -> Result<(), ApiError> {
    match access {
        Access::Granted => Ok(()),
        Access::Denied => Err(ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())),
        Access::Respond(response) => Err(response.to_api_error()),
    }
}

/// The dispatcher.
///
/// Holds the read-only registry, the ordered hook list, process-wide settings
/// and the ambient principal and request that calls are derived from. `call`
/// takes `&self`, so one `Api` can serve concurrent callers.
pub struct Api {
    registry: Arc<ResourceRegistry>,
    hooks: Vec<Arc<dyn Hook>>,
    config: ApiConfig,
    principal: Principal,
    request: Request,
}

impl Api {
    pub fn new(registry: Arc<ResourceRegistry>, config: ApiConfig) -> Self {
        Self {
            registry,
            hooks: Vec::new(),
            config: config.normalized(),
            principal: Principal::anonymous(),
            request: Request::default(),
        }
    }

    /// Register the built-in tracing, request-id and deprecation hooks.
    #[must_use]
    pub fn with_builtin_hooks(mut self) -> Self {
        let current_version = self.config.current_version;
        self.add_hook(Arc::new(TracingHook));
        self.add_hook(Arc::new(RequestIdHook));
        self.add_hook(Arc::new(DeprecationHook::new(current_version)));
        self
    }

    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = request;
        self
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = principal;
    }

    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    /// The principal calls act as.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The ambient request calls are derived from.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Append a hook; hooks run in registration order.
    pub fn add_hook(&mut self, hook: Arc<dyn Hook>) {
        info!(
            hooks_count = self.hooks.len() + 1,
            hook = std::any::type_name_of_val(hook.as_ref()),
            "Hook registered"
        );
        self.hooks.push(hook);
    }

    /// Build an error response with the uniform envelope.
    pub fn to_error(&self, message: &str, code: &str, status: u16) -> Response {
        Response::error(message, code, status)
    }

    /// Dispatch a call derived from the ambient request.
    ///
    /// `data` is merged into the query parameters for read-only verbs and into
    /// the parsed body otherwise. Never fails: every outcome is a response.
    pub fn call(&self, method: &str, path: &str, data: Params, headers: &[(&str, &str)]) -> Response {
        let Some(config) = self.registry.lookup(path) else {
            return self.not_found(path);
        };

        let verb = match parse_method(method) {
            Ok(verb) => verb,
            Err(err) => {
                warn!(method = %method, path = %path, "Invalid method");
                return Response::from(&err);
            }
        };

        let mut request = self.request.clone().with_method(verb).with_data(data);
        if request.path() != path {
            request = request.with_path(path);
        }
        for (name, value) in headers {
            request = request.with_header(name, value);
        }

        self.execute(config.as_ref(), path, request)
    }

    /// Dispatch a fully built request, e.g. one from [`Request::from_raw`].
    pub fn dispatch(&self, request: Request) -> Response {
        let path = request.path().to_string();
        match self.registry.lookup(&path) {
            Some(config) => self.execute(config.as_ref(), &path, request),
            None => self.not_found(&path),
        }
    }

    /// Run several calls in order and wrap their bodies, keyed by path, in one
    /// `200` response. A failing sub-call contributes its error envelope.
    pub fn call_multiple(&self, calls: &[SubCall]) -> Response {
        let mut bodies = Map::with_capacity(calls.len());
        for sub in calls {
            let headers: Vec<(&str, &str)> = sub
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let response = self.call(&sub.method, &sub.path, sub.data.clone(), &headers);
            bodies.insert(sub.path.clone(), response.data().clone());
        }
        debug!(calls_count = calls.len(), "Multiple calls completed");
        Response::ok(Value::Object(bodies))
    }

    /// Run the authentication service of the resource serving `path`.
    ///
    /// For host integration layers that authenticate before dispatching.
    pub fn authenticate(&self, method: &str, path: &str) -> Result<Principal, ApiError> {
        let config = self.registry.lookup(path).ok_or_else(|| {
            ApiError::NotFound(format!("The path \"{path}\" does not match any known resources."))
        })?;
        let request = self
            .request
            .clone()
            .with_method(parse_method(method)?)
            .with_path(path);

        match config.authentication_service().authenticate(&self.principal, &request) {
            Some(principal) => {
                debug!(path = %path, principal = ?principal.id, "Authenticated");
                Ok(principal)
            }
            None => {
                warn!(path = %path, principal = ?self.principal.id, "Authentication rejected");
                Err(ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))
            }
        }
    }

    fn not_found(&self, path: &str) -> Response {
        warn!(path = %path, "No resource matched");
        let err = ApiError::NotFound(format!(
            "The path \"{path}\" does not match any known resources."
        ));
        Response::from(&err)
    }

    fn execute(&self, config: &dyn ResourceConfig, path: &str, request: Request) -> Response {
        let start = Instant::now();
        let request_id = request.request_id().clone();
        let verb = request.verb();
        let version = request.version();

        info!(
            request_id = %request_id,
            method = %request.method(),
            path = %path,
            resource = %config.handler().name(),
            "Dispatch start"
        );

        if self.config.require_version
            && request.accepts_any(config.versioned_types())
            && request.explicit_version().is_none()
        {
            warn!(request_id = %request_id, path = %path, "Missing API version");
            return Response::from(&ApiError::MissingVersion(MISSING_VERSION_MESSAGE.to_string()));
        }

        let target = match resolve_method(
            config.handler().as_ref(),
            &verb,
            version,
            self.config.current_version,
        ) {
            Some(name) => Target::Method(name),
            None if verb == "options" => Target::Options,
            None => {
                warn!(request_id = %request_id, method = %verb, path = %path, "Method not allowed");
                return Response::from(&ApiError::NotAllowed(format!(
                    "The method \"{verb}\" is not available for the resource \"{path}\"."
                )));
            }
        };

        let args = config.arguments_for_path(normalize_path(path));
        let resolved = Resolved {
            target,
            verb: &verb,
            version,
        };
        let mut current = request;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_lifecycle(config, path, &resolved, &args, &mut current)
        }));

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(failure)) => self.map_error(failure.error, failure.response),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    request_id = %request_id,
                    resource = %config.handler().name(),
                    panic_message = %message,
                    "Handler panicked - CRITICAL"
                );
                self.map_error(ApiError::System(format!("Handler panicked: {message}")), None)
            }
        };

        let response = self.fold_response(path, config, &current, response);

        info!(
            request_id = %request_id,
            path = %path,
            status = response.status,
            duration_us = start.elapsed().as_micros() as u64,
            "Dispatch complete"
        );
        response
    }

    fn run_lifecycle(
        &self,
        config: &dyn ResourceConfig,
        path: &str,
        resolved: &Resolved<'_>,
        args: &[String],
        current: &mut Request,
    ) -> Result<Response, Failure> {
        // A panicking hook must leave the caller's request in place for the response hooks.
        let folded = self.fold_request(path, config, current.clone());
        *current = folded;

        let mut instance = config
            .handler()
            .instantiate(self.principal.clone(), current.clone());

        instance.before()?;
        debug!(request_id = %current.request_id(), "Resource before() complete");

        let context = instance.context();
        context
            .required_parameters()
            .validate(context.request().params())?;

        self.check_access(instance.as_mut(), config, resolved, args)?;

        let response = match &resolved.target {
            Target::Method(name) => {
                debug!(request_id = %current.request_id(), method = %name, "Invoking resource method");
                instance.invoke(name, args)?
            }
            Target::Options => {
                let allowed = allowed_methods(
                    config.handler().as_ref(),
                    resolved.version,
                    self.config.current_version,
                );
                Response::empty(200).with_header("allow", allowed.join(", "))
            }
        };

        match instance.after(&response) {
            Ok(Some(replaced)) => {
                debug!(request_id = %current.request_id(), "Resource after() replaced response");
                Ok(replaced)
            }
            Ok(None) => Ok(response),
            Err(error) => Err(Failure {
                error,
                response: Some(response),
            }),
        }
    }

    fn check_access(
        &self,
        instance: &mut dyn ResourceInstance,
        config: &dyn ResourceConfig,
        resolved: &Resolved<'_>,
        args: &[String],
    ) -> Result<(), ApiError> {
        let handler = config.handler();
        if handler.has_access_check(GENERIC_ACCESS) {
            access_failure(instance.check_access(GENERIC_ACCESS, args)?)?;
        }

        if let Some(name) = resolve_access_check(
            handler.as_ref(),
            resolved.verb,
            resolved.version,
            self.config.current_version,
        ) {
            access_failure(instance.check_access(&name, args)?)?;
        }
        Ok(())
    }

    fn fold_request(&self, path: &str, config: &dyn ResourceConfig, mut request: Request) -> Request {
        for hook in &self.hooks {
            if let Some(replaced) = hook.on_request(path, config, &request) {
                debug!(
                    hook = std::any::type_name_of_val(hook.as_ref()),
                    "Pre-request hook replaced request"
                );
                request = replaced;
            }
        }
        request
    }

    fn fold_response(
        &self,
        path: &str,
        config: &dyn ResourceConfig,
        request: &Request,
        mut response: Response,
    ) -> Response {
        for (index, hook) in self.hooks.iter().enumerate() {
            let replaced = guard_hook(index, "on_response", || {
                hook.on_response(path, config, request, &response)
            });
            if let Some(replaced) = replaced {
                response = replaced;
            }
        }
        response
    }

    fn map_error(&self, err: ApiError, partial: Option<Response>) -> Response {
        let mut handled: Option<Response> = None;
        for (index, hook) in self.hooks.iter().enumerate() {
            let current = handled.as_ref().or(partial.as_ref());
            if let Some(response) = guard_hook(index, "on_error", || hook.on_error(&err, current)) {
                handled = Some(response);
            }
        }

        if err.status() >= 500 || err.code() == SYSTEM_CODE {
            error!(code = %err.code(), status = err.status(), error = %err, "Call failed");
        } else {
            warn!(code = %err.code(), status = err.status(), error = %err, "Call rejected");
        }

        handled.unwrap_or_else(|| Response::from(&err))
    }
}
