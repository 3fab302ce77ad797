use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::configuration::{ConfigParts, ResourceConfig, ResourceConfiguration};
use super::core::ResourceDeclaration;
use crate::auth::{AllowAll, AuthenticationService, PermissionAuthenticationService, DEFAULT_AUTH};
use crate::config::ApiConfig;
use crate::error::ConfigError;
use crate::resource::ResourceHandler;

/// Name under which [`AllowAll`] is pre-registered.
pub const ALLOW_ALL_AUTH: &str = "allow_all";

/// Builds a custom [`ResourceConfig`] from resolved declaration parts.
pub type ConfigFactory =
    Arc<dyn Fn(ConfigParts) -> Result<Arc<dyn ResourceConfig>, ConfigError> + Send + Sync>;

/// Named handler types, authentication services and configuration factories
/// that declarations may reference.
///
/// Declarations refer to everything by name; the catalog is where the host
/// application makes those names mean something.
pub struct Catalog {
    resources: HashMap<String, Arc<dyn ResourceHandler>>,
    auth: HashMap<String, Arc<dyn AuthenticationService>>,
    configs: HashMap<String, ConfigFactory>,
    fallback: Option<Arc<dyn ResourceHandler>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// A catalog with the built-in `permission` and `allow_all` services.
    pub fn new() -> Self {
        let mut auth: HashMap<String, Arc<dyn AuthenticationService>> = HashMap::new();
        auth.insert(
            DEFAULT_AUTH.to_string(),
            Arc::new(PermissionAuthenticationService::default()),
        );
        auth.insert(ALLOW_ALL_AUTH.to_string(), Arc::new(AllowAll));
        Self {
            resources: HashMap::new(),
            auth,
            configs: HashMap::new(),
            fallback: None,
        }
    }

    /// Register a handler type under its own name.
    pub fn register_resource(&mut self, handler: Arc<dyn ResourceHandler>) -> &mut Self {
        self.resources.insert(handler.name().to_string(), handler);
        self
    }

    pub fn register_auth(
        &mut self,
        name: impl Into<String>,
        service: Arc<dyn AuthenticationService>,
    ) -> &mut Self {
        self.auth.insert(name.into(), service);
        self
    }

    pub fn register_config(&mut self, name: impl Into<String>, factory: ConfigFactory) -> &mut Self {
        self.configs.insert(name.into(), factory);
        self
    }

    /// Bind every handler reference the catalog does not know to `handler`.
    pub fn set_fallback_resource(&mut self, handler: Arc<dyn ResourceHandler>) -> &mut Self {
        self.fallback = Some(handler);
        self
    }

    pub fn resource(&self, name: &str) -> Option<&Arc<dyn ResourceHandler>> {
        self.resources.get(name).or(self.fallback.as_ref())
    }

    pub fn auth(&self, name: &str) -> Option<&Arc<dyn AuthenticationService>> {
        self.auth.get(name)
    }

    /// Resolve every reference of `decl` and build its configuration.
    pub fn build_config(
        &self,
        decl: &ResourceDeclaration,
        settings: &ApiConfig,
    ) -> Result<Arc<dyn ResourceConfig>, ConfigError> {
        let handler = self
            .resource(&decl.handler)
            .ok_or_else(|| ConfigError::ClassNotValid {
                path: decl.path.clone(),
                handler: decl.handler.clone(),
            })?;

        let auth_name = decl.auth.as_deref().unwrap_or(&settings.default_auth);
        let auth = self
            .auth(auth_name)
            .ok_or_else(|| ConfigError::AuthClassNotValid {
                path: decl.path.clone(),
                auth: auth_name.to_string(),
            })?;

        let parts = ConfigParts {
            raw_path: decl.path.clone(),
            module: decl.module.clone(),
            url_prefix: settings.url_prefix.clone(),
            handler: Arc::clone(handler),
            auth: Arc::clone(auth),
        };

        match decl.config.as_deref() {
            Some(name) => {
                let factory = self.configs.get(name).ok_or_else(|| ConfigError::ConfigNotValid {
                    path: decl.path.clone(),
                    config: name.to_string(),
                })?;
                debug!(path = %decl.path, config = %name, "Using custom resource configuration");
                factory(parts)
            }
            None => Ok(Arc::new(ResourceConfiguration::new(parts)?)),
        }
    }
}
