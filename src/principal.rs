use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// The user a call is made on behalf of.
///
/// The host application owns its user model; this is the slice of it the
/// dispatcher and resources need: an identity, whether it is authenticated, the
/// permissions granted to it and any claims attached by an upstream identity
/// provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier; `None` for the anonymous user
    pub id: Option<String>,
    /// Permission names granted to this principal
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Decoded identity claims, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Value>,
}

impl Principal {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Some(claims);
        self
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
