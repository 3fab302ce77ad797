use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::ApiError;
use crate::principal::Principal;
use crate::request::{is_empty_value, Params, Request};
use crate::response::Response;

/// Predicate applied to a present, non-empty parameter value.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Required-parameter declarations of a handler instance, in declaration order.
#[derive(Clone, Default)]
pub struct RequiredParameters {
    entries: Vec<(String, Option<Validator>)>,
}

impl fmt::Debug for RequiredParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, v)| (name, if v.is_some() { "validated" } else { "required" })),
            )
            .finish()
    }
}

impl RequiredParameters {
    /// Declare a parameter as required. Re-declaring a name replaces its validator.
    pub fn require(&mut self, name: impl Into<String>) {
        self.insert(name.into(), None);
    }

    /// Declare a required parameter that must also satisfy `validator`.
    pub fn require_with<F>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.insert(name.into(), Some(Arc::new(validator)));
    }

    fn insert(&mut self, name: String, validator: Option<Validator>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = validator,
            None => self.entries.push((name, validator)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every declaration against `params`.
    ///
    /// All absent/empty parameters are reported together as `MissingParameters`.
    /// Only when none are missing are validator failures reported, again all
    /// together, as `InvalidParameters`.
    pub fn validate(&self, params: &Params) -> Result<(), ApiError> {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        for (name, validator) in &self.entries {
            match params.get(name) {
                Some(value) if !is_empty_value(value) => {
                    if let Some(check) = validator {
                        if !check(value) {
                            invalid.push(name.clone());
                        }
                    }
                }
                _ => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(ApiError::MissingParameters(missing));
        }
        if !invalid.is_empty() {
            return Err(ApiError::InvalidParameters(invalid));
        }
        Ok(())
    }
}

/// What a handler instance is bound to for the duration of one call.
#[derive(Debug, Clone)]
pub struct ResourceContext {
    principal: Principal,
    request: Request,
    required: RequiredParameters,
}

impl ResourceContext {
    pub fn new(principal: Principal, request: Request) -> Self {
        Self {
            principal,
            request,
            required: RequiredParameters::default(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn required_parameters(&self) -> &RequiredParameters {
        &self.required
    }

    pub fn required_parameters_mut(&mut self) -> &mut RequiredParameters {
        &mut self.required
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// The call may proceed.
    Granted,
    /// The call is rejected with `403 unauthorized`.
    Denied,
    /// The call is rejected with the status, code and message of this response.
    Respond(Response),
}

impl From<bool> for Access {
    fn from(allowed: bool) -> Self {
        if allowed {
            Access::Granted
        } else {
            Access::Denied
        }
    }
}

impl From<Response> for Access {
    fn from(response: Response) -> Self {
        Access::Respond(response)
    }
}

/// Contract implemented by every handler type.
///
/// Only the context accessors are required. `before` runs ahead of parameter
/// validation and access checks, so it is the place to declare required
/// parameters. `after` sees the business method's response and may replace it
/// by returning `Some`.
pub trait Resource: Send + 'static {
    fn context(&self) -> &ResourceContext;

    fn context_mut(&mut self) -> &mut ResourceContext;

    fn before(&mut self) -> Result<(), ApiError> {
        Ok(())
    }

    fn after(&mut self, _response: &Response) -> Result<Option<Response>, ApiError> {
        Ok(None)
    }

    fn principal(&self) -> &Principal {
        self.context().principal()
    }

    fn request(&self) -> &Request {
        self.context().request()
    }

    fn require_parameter(&mut self, name: &str) {
        self.context_mut().required_parameters_mut().require(name);
    }

    fn require_parameter_with<F>(&mut self, name: &str, validator: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
        Self: Sized,
    {
        self.context_mut()
            .required_parameters_mut()
            .require_with(name, validator);
    }

    fn to_json(&self, data: Value, status: u16) -> Response {
        Response::json(status, data)
    }

    fn to_error(&self, message: &str, code: &str, status: u16) -> Response {
        Response::error(message, code, status)
    }

    fn to_403(&self, message: Option<&str>) -> Response {
        Response::to_403(message)
    }

    fn to_404(&self, message: Option<&str>) -> Response {
        Response::to_404(message)
    }
}
