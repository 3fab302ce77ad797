use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::catalog::Catalog;
use super::configuration::{normalize_path, ResourceConfig};
use crate::config::ApiConfig;
use crate::error::ConfigError;

/// One entry of a registration declaration: a raw path pattern and the names
/// of what serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDeclaration {
    /// Raw path pattern, e.g. `items/%`
    pub path: String,
    /// Handler type name (required)
    pub handler: String,
    /// Owning module label, informational
    pub module: String,
    /// Authentication service name; defaults to the configured default
    pub auth: Option<String>,
    /// Custom configuration factory name
    pub config: Option<String>,
}

impl ResourceDeclaration {
    pub fn new(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handler: handler.into(),
            module: String::new(),
            auth: None,
            config: None,
        }
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }
}

#[derive(Deserialize)]
struct DeclarationBody {
    handler: String,
    #[serde(default)]
    module: String,
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    config: Option<String>,
}

/// Declarations keyed by raw path, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(pub Vec<ResourceDeclaration>);

impl<'de> Deserialize<'de> for Declarations {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Declarations;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from path pattern to resource declaration")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((path, body)) = map.next_entry::<String, DeclarationBody>()? {
                    out.push(ResourceDeclaration {
                        path,
                        handler: body.handler,
                        module: body.module,
                        auth: body.auth,
                        config: body.config,
                    });
                }
                Ok(Declarations(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Path pattern to configuration mapping, built once and read-only afterwards.
///
/// Lookup returns at most one configuration: a literal match wins over a
/// wildcard match, and among wildcard matches the first registered wins.
#[derive(Default)]
pub struct ResourceRegistry {
    configs: Vec<Arc<dyn ResourceConfig>>,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.configs.iter().map(|c| c.path()))
            .finish()
    }
}

impl ResourceRegistry {
    /// Build the registry from declarations, in order. The first failing
    /// declaration aborts the whole build.
    pub fn build(
        declarations: &[ResourceDeclaration],
        catalog: &Catalog,
        settings: &ApiConfig,
    ) -> Result<Self, ConfigError> {
        let configs = declarations
            .iter()
            .map(|decl| catalog.build_config(decl, settings))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_configs(configs)
    }

    /// Wrap already-built configurations. Two configurations with the same
    /// effective path are rejected.
    pub fn from_configs(configs: Vec<Arc<dyn ResourceConfig>>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(configs.len());
        for config in &configs {
            if !seen.insert(config.path().to_string()) {
                return Err(ConfigError::DuplicatePath(config.path().to_string()));
            }
        }

        let summary: Vec<String> = configs
            .iter()
            .take(10)
            .map(|c| format!("{} -> {}", c.path(), c.handler().name()))
            .collect();
        info!(
            resources_count = configs.len(),
            resources_summary = ?summary,
            "Resource registry loaded"
        );

        Ok(Self { configs })
    }

    /// Resolve an inbound path to its configuration.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Arc<dyn ResourceConfig>> {
        let path = normalize_path(path);
        let found = self
            .configs
            .iter()
            .find(|c| c.is_literal_match(path))
            .or_else(|| self.configs.iter().find(|c| c.matches_path(path)));

        match found {
            Some(config) => debug!(path = %path, pattern = %config.path(), "Resource matched"),
            None => debug!(path = %path, "No resource matched"),
        }
        found
    }

    /// Configurations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceConfig>> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
