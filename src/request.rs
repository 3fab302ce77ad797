//! # Request Module
//!
//! [`Request`] is the immutable value carried through a dispatch. Every
//! "modification" (`with_method`, `with_data`, `with_header`, `with_path`,
//! `with_uri`) consumes the value and returns a new one, so the dispatcher can
//! derive a call-scoped request from the caller's request without touching the
//! caller's copy.
//!
//! Parameters live in two separate stores:
//!
//! - **query parameters** - populated from the URI query string; used by read-only verbs
//! - **parsed body** - populated from the message body of PUT/POST/PATCH/DELETE requests
//!
//! A value never moves between the two stores.
//!
//! ## Versioning
//!
//! The API version is read from the `Accept` header, e.g.
//! `Accept: application/json; version=3`. Only the first JSON media type carrying a
//! `version` attribute is honoured; without one the version defaults to 1.

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Maximum number of headers stored inline before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage: lowercase names, insertion order preserved.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A parameter store (query string or parsed body).
pub type Params = Map<String, Value>;

/// The JSON content type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

static VERSION_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?i)version\s*=\s*"?[vV]?([0-9]+)"?$"#).expect("Failed to compile version regex")
});

/// Whether the verb carries its data in the message body.
#[must_use]
pub fn vars_in_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::PUT | Method::POST | Method::PATCH | Method::DELETE
    )
}

/// Parse a case-insensitive verb into a [`Method`].
pub fn parse_method(verb: &str) -> Result<Method, ApiError> {
    Method::from_bytes(verb.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ApiError::NotAllowed(format!("The method \"{verb}\" is not a valid HTTP method.")))
}

/// Parse a query string (without the leading `?`) into a parameter store.
#[must_use]
pub fn parse_query(query: &str) -> Params {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

/// Whether a parameter value counts as absent for required-parameter checks.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn is_json_media_type(media: &str) -> bool {
    media == JSON_CONTENT_TYPE || media.ends_with("+json")
}

/// One entry of an `Accept` header: lowercase media type plus raw attributes.
fn accept_entries(accept: &str) -> impl Iterator<Item = (String, Vec<&str>)> {
    accept.split(',').filter_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let media = parts.next()?.to_ascii_lowercase();
        if media.is_empty() {
            return None;
        }
        Some((media, parts.collect()))
    })
}

/// An HTTP-style request flowing through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderVec,
    query_params: Params,
    parsed_body: Params,
    request_id: RequestId,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl Request {
    /// Create an empty request for the given method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderVec::new(),
            query_params: Params::new(),
            parsed_body: Params::new(),
            request_id: RequestId::new(),
        }
    }

    /// Build a request from raw transport parts.
    ///
    /// The URI may carry a query string. For PUT/POST/PATCH/DELETE the body is
    /// decoded as JSON when the content type is JSON (only an object populates the
    /// parsed body), otherwise as `application/x-www-form-urlencoded`.
    pub fn from_raw(
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Self, ApiError> {
        let method = parse_method(method)?;
        let mut request = Request::new(method, "/").with_uri(uri);
        for (name, value) in headers {
            request = request.with_header(name, value);
        }

        if vars_in_body(&request.method) && !body.is_empty() {
            let parsed = if request.is_json() {
                match serde_json::from_slice::<Value>(body) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => Params::new(),
                    Err(e) => {
                        debug!(error = %e, "JSON body parse failed");
                        Params::new()
                    }
                }
            } else {
                url::form_urlencoded::parse(body)
                    .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                    .collect()
            };
            debug!(
                body_fields = parsed.len(),
                body_size_bytes = body.len(),
                "Request body parsed"
            );
            request.parsed_body = parsed;
        }

        Ok(request)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The verb in lowercase, as used for method-name resolution.
    #[must_use]
    pub fn verb(&self) -> String {
        self.method.as_str().to_ascii_lowercase()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    #[must_use]
    pub fn parsed_body(&self) -> &Params {
        &self.parsed_body
    }

    /// The store that holds this request's data: parsed body for verbs that carry
    /// a body, query parameters for everything else.
    #[must_use]
    pub fn params(&self) -> &Params {
        if vars_in_body(&self.method) {
            &self.parsed_body
        } else {
            &self.query_params
        }
    }

    /// Look a parameter up in the method-appropriate store.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params().get(name)
    }

    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Whether the content type is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE))
            .unwrap_or(false)
    }

    /// The version explicitly requested through the `Accept` header, if any.
    #[must_use]
    pub fn explicit_version(&self) -> Option<u32> {
        let accept = self.header("accept")?;
        accept_entries(accept)
            .filter(|(media, _)| is_json_media_type(media))
            .find_map(|(_, attrs)| {
                attrs.iter().find_map(|attr| {
                    VERSION_PARAM
                        .captures(attr)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                        .filter(|v| *v > 0)
                })
            })
    }

    /// The requested API version (default 1).
    #[must_use]
    pub fn version(&self) -> u32 {
        self.explicit_version().unwrap_or(1)
    }

    /// Whether the `Accept` header lists any of the given media types.
    #[must_use]
    pub fn accepts_any(&self, media_types: &[String]) -> bool {
        let Some(accept) = self.header("accept") else {
            return false;
        };
        accept_entries(accept).any(|(media, _)| {
            media_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&media))
        })
    }

    /// Return a copy with a different method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Merge data into the method-appropriate store. Supplied keys override
    /// existing ones; other keys are retained.
    #[must_use]
    pub fn with_data(mut self, data: Params) -> Self {
        let store = if vars_in_body(&self.method) {
            &mut self.parsed_body
        } else {
            &mut self.query_params
        };
        for (key, value) in data {
            store.insert(key, value);
        }
        self
    }

    /// Return a copy with the header set, replacing any value of the same name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        self.headers.retain(|(k, _)| k.as_ref() != name);
        if name == REQUEST_ID_HEADER {
            self.request_id = RequestId::from_header_or_new(Some(value));
        }
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Return a copy with a different path. Query parameters are untouched.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Return a copy with the path and query string taken from `uri`.
    #[must_use]
    pub fn with_uri(mut self, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => {
                self.path = path.to_string();
                self.query_params = parse_query(query);
            }
            None => {
                self.path = uri.to_string();
                self.query_params = Params::new();
            }
        }
        self
    }

    #[must_use]
    pub fn with_query_params(mut self, params: Params) -> Self {
        self.query_params = params;
        self
    }

    #[must_use]
    pub fn with_parsed_body(mut self, params: Params) -> Self {
        self.parsed_body = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_json_body_populates_parsed_body_for_body_verbs() {
        for verb in ["PUT", "POST", "PATCH", "DELETE"] {
            let req = Request::from_raw(
                verb,
                "/items",
                &[("Content-Type", "application/json")],
                br#"{"var":"set"}"#,
            )
            .unwrap();
            assert_eq!(req.parsed_body().get("var"), Some(&json!("set")), "{verb}");
        }
    }

    #[test]
    fn test_non_json_body_is_form_decoded() {
        let req = Request::from_raw(
            "POST",
            "/items",
            &[("content-type", "application/x-www-form-urlencoded")],
            b"var=set&other=1",
        )
        .unwrap();
        assert_eq!(req.parsed_body().get("var"), Some(&json!("set")));
        assert_eq!(req.parsed_body().get("other"), Some(&json!("1")));
    }

    #[test]
    fn test_get_body_is_ignored() {
        let req = Request::from_raw(
            "GET",
            "/items?var=query",
            &[("content-type", "application/json")],
            br#"{"var":"body"}"#,
        )
        .unwrap();
        assert!(req.parsed_body().is_empty());
        assert_eq!(req.query_params().get("var"), Some(&json!("query")));
    }

    #[test]
    fn test_non_object_json_body_is_ignored() {
        let req = Request::from_raw(
            "POST",
            "/items",
            &[("content-type", "application/json")],
            b"[1,2,3]",
        )
        .unwrap();
        assert!(req.parsed_body().is_empty());
    }

    #[test]
    fn test_version_from_accept_header() {
        let req = Request::default().with_header("Accept", "application/json; version=3");
        assert_eq!(req.version(), 3);
        assert_eq!(req.explicit_version(), Some(3));
    }

    #[test]
    fn test_first_versioned_json_entry_wins() {
        let req = Request::default().with_header(
            "accept",
            "text/html, application/json; version=2, application/vnd.api+json; version=4",
        );
        assert_eq!(req.version(), 2);
    }

    #[test]
    fn test_version_on_non_json_type_is_ignored() {
        let req = Request::default().with_header("accept", "text/html; version=7");
        assert_eq!(req.explicit_version(), None);
        assert_eq!(req.version(), 1);
    }

    #[test]
    fn test_version_defaults_to_one() {
        let req = Request::default().with_header("accept", "application/json");
        assert_eq!(req.version(), 1);
        assert_eq!(Request::default().version(), 1);
    }

    #[test]
    fn test_request_id_is_stable_and_client_overridable() {
        let req = Request::default();
        let first = req.request_id().clone();
        assert_eq!(&first, req.request_id());

        let req = req.with_header("X-Request-Id", "client-set-id");
        assert_eq!(req.request_id().as_str(), "client-set-id");
    }

    #[test]
    fn test_with_data_merges_into_method_store() {
        let base = Request::new(Method::GET, "/x")
            .with_query_params(params(json!({"foo": "foo", "keep": 1})));
        let req = base.clone().with_data(params(json!({"foo": "newfoo", "new": "value"})));
        assert_eq!(req.query_params().get("foo"), Some(&json!("newfoo")));
        assert_eq!(req.query_params().get("new"), Some(&json!("value")));
        assert_eq!(req.query_params().get("keep"), Some(&json!(1)));
        assert!(req.parsed_body().is_empty());
        // the caller's copy is untouched
        assert_eq!(base.query_params().get("foo"), Some(&json!("foo")));

        let req = base
            .with_method(Method::POST)
            .with_data(params(json!({"foo": "newfoo"})));
        assert_eq!(req.parsed_body().get("foo"), Some(&json!("newfoo")));
        assert_eq!(req.query_params().get("foo"), Some(&json!("foo")));
    }

    #[test]
    fn test_headers_are_case_insensitive_and_replaced() {
        let req = Request::default()
            .with_header("X-Thing", "a")
            .with_header("x-thing", "b");
        assert_eq!(req.header("X-THING"), Some("b"));
        assert_eq!(req.headers().len(), 1);
    }

    #[test]
    fn test_accepts_any() {
        let req = Request::default().with_header("accept", "text/html, Application/JSON; version=1");
        assert!(req.accepts_any(&["application/json".to_string()]));
        assert!(!req.accepts_any(&["application/xml".to_string()]));
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!("0")));
        assert!(is_empty_value(&json!(0)));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!("a")));
        assert!(!is_empty_value(&json!(5)));
    }

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(parse_method("not a verb").is_err());
    }
}
