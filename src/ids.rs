use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Header a client uses to supply its own correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation identifier for one request.
///
/// Either supplied by the client through [`REQUEST_ID_HEADER`] or generated as a
/// ULID. The value is fixed when the request is built, so repeated reads and
/// derived requests observe the same identifier.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn new() -> Self {
        Self(Arc::from(ulid::Ulid::new().to_string()))
    }

    /// Use the header value when it is present and non-blank; otherwise generate one.
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing a blank correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request id must not be blank")]
pub struct BlankRequestId;

impl FromStr for RequestId {
    type Err = BlankRequestId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(BlankRequestId);
        }
        Ok(RequestId(Arc::from(trimmed)))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}
