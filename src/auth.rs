//! # Authentication Module
//!
//! Each registered resource is paired with an [`AuthenticationService`]. The host
//! integration layer runs it (through [`Api::authenticate`](crate::dispatcher::Api::authenticate))
//! before dispatching, to establish the principal the call acts as. The dispatcher
//! itself only enforces the per-resource access checks.
//!
//! ## Default service
//!
//! [`PermissionAuthenticationService`] accepts an authenticated principal that
//! holds the `access content` permission:
//!
//! ```rust
//! use restapi::auth::{AuthenticationService, PermissionAuthenticationService};
//! use restapi::{Principal, Request};
//!
//! let service = PermissionAuthenticationService::default();
//! let user = Principal::authenticated("7").with_permission("access content");
//! assert!(service.authenticate(&user, &Request::default()).is_some());
//! assert!(service.authenticate(&Principal::anonymous(), &Request::default()).is_none());
//! ```

use crate::principal::Principal;
use crate::request::Request;

/// Name under which the default service is registered in a catalog.
pub const DEFAULT_AUTH: &str = "permission";

/// Permission required by [`PermissionAuthenticationService`] by default.
pub const ACCESS_CONTENT: &str = "access content";

/// Authenticates a request on behalf of a principal.
pub trait AuthenticationService: Send + Sync {
    /// Returns the principal the request is authenticated as, or `None` to reject it.
    fn authenticate(&self, principal: &Principal, request: &Request) -> Option<Principal>;
}

/// Accepts authenticated principals holding a given permission.
#[derive(Debug, Clone)]
pub struct PermissionAuthenticationService {
    permission: String,
}

impl PermissionAuthenticationService {
    pub fn new(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
        }
    }
}

impl Default for PermissionAuthenticationService {
    fn default() -> Self {
        Self::new(ACCESS_CONTENT)
    }
}

impl AuthenticationService for PermissionAuthenticationService {
    fn authenticate(&self, principal: &Principal, _request: &Request) -> Option<Principal> {
        if !principal.is_authenticated() || !principal.has_permission(&self.permission) {
            return None;
        }
        Some(principal.clone())
    }
}

/// Accepts every request as-is, including anonymous ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthenticationService for AllowAll {
    fn authenticate(&self, principal: &Principal, _request: &Request) -> Option<Principal> {
        Some(principal.clone())
    }
}
