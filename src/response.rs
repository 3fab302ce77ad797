use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{ApiError, SYSTEM_CODE};
use crate::request::{HeaderVec, JSON_CONTENT_TYPE};

/// Response produced by a dispatch.
///
/// Carries the HTTP status code, headers, and a JSON-serializable body. Error
/// responses use the envelope `{ "error": <code>, "message": <message> }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl Response {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), JSON_CONTENT_TYPE.to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// A `200` JSON response.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    /// A response without a body (`null` payload).
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Create an error response using the uniform error envelope.
    #[must_use]
    pub fn error(message: &str, code: &str, status: u16) -> Self {
        Self::json(status, json!({ "error": code, "message": message }))
    }

    /// A `500 system` error response.
    #[must_use]
    pub fn system_error(message: &str) -> Self {
        Self::error(message, SYSTEM_CODE, 500)
    }

    /// A `400 validation_failed` response.
    #[must_use]
    pub fn to_400(message: Option<&str>) -> Self {
        Self::error(message.unwrap_or("Validation failed"), "validation_failed", 400)
    }

    /// A `403 forbidden` response.
    #[must_use]
    pub fn to_403(message: Option<&str>) -> Self {
        Self::error(message.unwrap_or("Permission denied"), "forbidden", 403)
    }

    /// A `404 not_found` response.
    #[must_use]
    pub fn to_404(message: Option<&str>) -> Self {
        Self::error(message.unwrap_or("Resource not found"), "not_found", 404)
    }

    /// A `206 Partial Content` response for a slice of a collection.
    ///
    /// `start` and `end` are inclusive item offsets; `total` is the collection size.
    #[must_use]
    pub fn range(body: Value, start: usize, end: usize, total: usize) -> Self {
        let mut resp = Self::json(206, body);
        resp.set_header("content-range", format!("items {start}-{end}/{total}"));
        resp
    }

    /// The decoded body, for composing several responses into one.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
    }

    /// Builder-style variant of [`Response::set_header`].
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    /// Read the error envelope of this response as a typed error.
    ///
    /// Used when an access check answers with a response: the response's status,
    /// `error` code and `message` are carried by the resulting error.
    #[must_use]
    pub fn to_api_error(&self) -> ApiError {
        let code = self
            .body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(SYSTEM_CODE);
        let message = self
            .body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        ApiError::custom(self.status, code, message)
    }
}

impl From<&ApiError> for Response {
    fn from(err: &ApiError) -> Self {
        Response::error(&err.message(), err.code(), err.status())
    }
}
