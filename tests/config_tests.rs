//! Declaration files: format selection, document order and registry bootstrap.

mod common;

use common::*;
use restapi::config::load_declarations;
use restapi::error::ConfigError;
use restapi::registry::{Catalog, ResourceRegistry};
use restapi::{Api, Params};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn declaration_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const YAML: &str = "\
settings:
  current_version: 2
  url_prefix: api
resources:
  zeta/%:
    handler: items
  alpha:
    handler: versioned
    module: catalog
    auth: allow_all
";

const JSON: &str = r#"{
  "settings": { "require_version": true },
  "resources": {
    "zeta/%": { "handler": "items" },
    "alpha": { "handler": "versioned" }
  }
}"#;

const TOML: &str = r#"
[settings]
current_version = 3

[resources."zeta/%"]
handler = "items"

[resources.alpha]
handler = "versioned"
module = "catalog"
"#;

fn paths(content: &str, suffix: &str) -> Vec<String> {
    let file = declaration_file(suffix, content);
    let loaded = load_declarations(file.path()).unwrap();
    loaded.resources.0.iter().map(|d| d.path.clone()).collect()
}

#[test]
fn test_yaml_declarations() {
    let file = declaration_file(".yaml", YAML);
    let loaded = load_declarations(file.path()).unwrap();

    assert_eq!(loaded.settings.current_version, 2);
    assert_eq!(loaded.settings.url_prefix.as_deref(), Some("api"));
    assert_eq!(loaded.settings.default_auth, "permission");

    let alpha = &loaded.resources.0[1];
    assert_eq!(alpha.handler, "versioned");
    assert_eq!(alpha.module, "catalog");
    assert_eq!(alpha.auth.as_deref(), Some("allow_all"));
}

#[test]
fn test_json_declarations() {
    let file = declaration_file(".json", JSON);
    let loaded = load_declarations(file.path()).unwrap();

    assert!(loaded.settings.require_version);
    assert_eq!(loaded.settings.current_version, 1);
    assert_eq!(loaded.resources.0.len(), 2);
}

#[test]
fn test_toml_declarations() {
    let file = declaration_file(".toml", TOML);
    let loaded = load_declarations(file.path()).unwrap();

    assert_eq!(loaded.settings.current_version, 3);
    assert_eq!(loaded.resources.0[1].module, "catalog");
}

#[test]
fn test_document_order_is_kept() {
    for (content, suffix) in [(YAML, ".yml"), (JSON, ".json"), (TOML, ".toml")] {
        assert_eq!(paths(content, suffix), ["zeta/%", "alpha"], "{suffix}");
    }
}

#[test]
fn test_unsupported_extension() {
    let file = declaration_file(".ini", "resources = none");
    let err = load_declarations(file.path()).unwrap_err();
    assert!(err.to_string().contains("Unsupported"), "{err}");
}

#[test]
fn test_missing_file() {
    let err = load_declarations(std::path::Path::new("/nonexistent/restapi.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"), "{err}");
}

#[test]
fn test_loaded_file_serves_calls() {
    let file = declaration_file(".yaml", YAML);
    let loaded = load_declarations(file.path()).unwrap();

    let log = call_log();
    let mut catalog = Catalog::new();
    catalog
        .register_resource(items_handler(&log))
        .register_resource(versioned_handler());
    let registry = ResourceRegistry::build(&loaded.resources.0, &catalog, &loaded.settings).unwrap();
    let api = Api::new(Arc::new(registry), loaded.settings);

    assert_eq!(api.call("GET", "api/zeta/9", Params::new(), &[]).status, 200);
    assert_eq!(entries(&log), ["get:9"]);

    let accept = accept_version(2);
    let res = api.call("GET", "api/alpha", Params::new(), &[("Accept", &accept)]);
    assert_eq!(res.body["method"], "getV2");

    assert_eq!(api.call("GET", "zeta/9", Params::new(), &[]).status, 404);
}

#[test]
fn test_unknown_handler_aborts_bootstrap() {
    let file = declaration_file(".yaml", YAML);
    let loaded = load_declarations(file.path()).unwrap();

    let log = call_log();
    let mut catalog = Catalog::new();
    catalog.register_resource(items_handler(&log));

    let err = ResourceRegistry::build(&loaded.resources.0, &catalog, &loaded.settings).unwrap_err();
    assert_eq!(
        err,
        ConfigError::ClassNotValid {
            path: "alpha".to_string(),
            handler: "versioned".to_string(),
        }
    );
}
