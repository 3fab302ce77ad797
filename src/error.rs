//! # Error Module
//!
//! Two error families live here:
//!
//! - [`ApiError`] - failures raised while a single call is being dispatched. Every
//!   variant maps deterministically onto an HTTP status and a machine-readable
//!   short code, and is rendered by the dispatcher into the uniform error envelope
//!   `{ "error": <code>, "message": <message> }`.
//! - [`ConfigError`] - failures raised while the resource registry is bootstrapped.
//!   These are deployment errors and abort registry construction entirely.
//!
//! | Variant | Status | Code |
//! |---|---|---|
//! | `NotFound` | 404 | `not_found` |
//! | `NotAllowed` | 405 | `not_allowed` |
//! | `MissingVersion` | 400 | `missing_version` |
//! | `Unauthorized` | 403 | `unauthorized` |
//! | `MissingParameters` | 400 | `missing_parameters` |
//! | `InvalidParameters` | 400 | `invalid_parameters` |
//! | `Custom` | any | any |
//! | `System` | 500 | `system` |

use thiserror::Error;

/// Machine code used for any failure without a more specific category.
pub const SYSTEM_CODE: &str = "system";

/// A typed failure raised during the call lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The path does not exist, or the caller must not learn that it exists.
    #[error("{0}")]
    NotFound(String),
    /// The resource exists but does not implement the requested verb.
    #[error("{0}")]
    NotAllowed(String),
    /// A versioned content type was negotiated without an explicit version.
    #[error("{0}")]
    MissingVersion(String),
    /// An access check rejected the call.
    #[error("{0}")]
    Unauthorized(String),
    /// One or more required parameters were absent or empty.
    #[error("Missing required parameter(s): {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    /// One or more parameters failed their validator.
    #[error("Invalid values for parameter(s): {}", .0.join(", "))]
    InvalidParameters(Vec<String>),
    /// A resource-defined failure carrying its own status and code.
    #[error("{message}")]
    Custom {
        /// HTTP status of the rendered response
        status: u16,
        /// Machine-readable short code
        code: String,
        /// Human-readable message
        message: String,
    },
    /// Any other failure, including handler contract violations and panics.
    #[error("{0}")]
    System(String),
}

impl ApiError {
    /// Build a resource-defined error.
    pub fn custom(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Custom {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::NotAllowed(_) => 405,
            ApiError::Unauthorized(_) => 403,
            ApiError::MissingVersion(_)
            | ApiError::MissingParameters(_)
            | ApiError::InvalidParameters(_) => 400,
            ApiError::Custom { status, .. } => *status,
            ApiError::System(_) => 500,
        }
    }

    /// Machine-readable short code for this error.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::NotAllowed(_) => "not_allowed",
            ApiError::MissingVersion(_) => "missing_version",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::MissingParameters(_) => "missing_parameters",
            ApiError::InvalidParameters(_) => "invalid_parameters",
            ApiError::Custom { code, .. } => code,
            ApiError::System(_) => SYSTEM_CODE,
        }
    }

    /// Human-readable message; identical to the `Display` output.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::System(format!("{err:#}"))
    }
}

/// A failure while building the resource registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The handler reference is unknown to the catalog.
    #[error("The provided handler {handler} for path \"{path}\" does not exist, or is not a registered resource type.")]
    ClassNotValid {
        /// Raw path of the offending declaration
        path: String,
        /// The handler reference that failed to resolve
        handler: String,
    },
    /// The authentication-service reference is unknown to the catalog.
    #[error("The provided authentication service {auth} for path \"{path}\" does not exist, or is not a registered authentication service.")]
    AuthClassNotValid {
        /// Raw path of the offending declaration
        path: String,
        /// The auth reference that failed to resolve
        auth: String,
    },
    /// The custom configuration reference is unknown to the catalog.
    #[error("The provided configuration type {config} for path \"{path}\" is not registered.")]
    ConfigNotValid {
        /// Raw path of the offending declaration
        path: String,
        /// The configuration reference that failed to resolve
        config: String,
    },
    /// Two declarations resolve to the same effective path pattern.
    #[error("The path \"{0}\" is declared more than once.")]
    DuplicatePath(String),
    /// The effective path pattern could not be compiled into a matcher.
    #[error("The path \"{path}\" is not a valid pattern: {reason}")]
    InvalidPattern {
        /// Effective path pattern
        path: String,
        /// Underlying compilation error
        reason: String,
    },
}
