use std::sync::Arc;

use super::*;
use crate::auth::AllowAll;
use crate::config::ApiConfig;
use crate::echo::EchoResource;
use crate::error::ConfigError;
use crate::resource::ResourceHandler;

fn parts(raw: &str, prefix: Option<&str>) -> ConfigParts {
    ConfigParts {
        raw_path: raw.to_string(),
        module: "test".to_string(),
        url_prefix: prefix.map(str::to_string),
        handler: EchoResource::handler("echo"),
        auth: Arc::new(AllowAll),
    }
}

fn config(raw: &str) -> ResourceConfiguration {
    ResourceConfiguration::new(parts(raw, None)).unwrap()
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register_resource(EchoResource::handler("items"))
        .register_resource(EchoResource::handler("other"));
    catalog
}

#[test]
fn test_prefix_resolution() {
    assert_eq!(resolve_effective_path("to/resource", Some("myprefix")), "myprefix/to/resource");
    assert_eq!(resolve_effective_path("/to/resource/", Some("/myprefix/")), "myprefix/to/resource");
    assert_eq!(resolve_effective_path("to/resource", None), "to/resource");
    assert_eq!(resolve_effective_path("to/resource", Some("")), "to/resource");
    assert_eq!(resolve_effective_path(ROOT, Some("myprefix")), "myprefix");
    assert_eq!(resolve_effective_path(ROOT, None), "/");
}

#[test]
fn test_matches_exact_segment_count() {
    let c = config("path/%/resource");
    assert!(c.matches_path("path/x/resource"));
    assert!(!c.matches_path("path/x/y/resource"));
    assert!(!c.matches_path("path/resource"));
    assert!(!c.matches_path("path/x/resource/more"));
    assert!(!c.matches_path("prefix/path/x/resource"));
}

#[test]
fn test_arguments_in_pattern_order() {
    let c = config("a/%/b/%/%");
    assert_eq!(c.arguments_for_path("a/1/b/2/3").as_slice(), ["1", "2", "3"]);
    assert!(c.arguments_for_path("a/1/c/2/3").is_empty());
    assert!(config("static/path").arguments_for_path("static/path").is_empty());
}

#[test]
fn test_matching_is_idempotent() {
    let c = config("items/%");
    for _ in 0..3 {
        assert!(c.matches_path("items/42"));
        assert_eq!(c.arguments_for_path("items/42").as_slice(), ["42"]);
    }
    assert_eq!(c.path(), "items/%");
}

#[test]
fn test_literal_segments_are_not_regex() {
    let c = config("v1.0/items");
    assert!(c.matches_path("v1.0/items"));
    assert!(!c.matches_path("v1x0/items"));
}

#[test]
fn test_root_pattern() {
    let c = ResourceConfiguration::new(parts(ROOT, None)).unwrap();
    assert_eq!(c.path(), "/");
    assert!(c.matches_path("/"));
    assert!(!c.matches_path("items"));
}

#[test]
fn test_default_metadata() {
    let c = config("items");
    assert_eq!(c.versioned_types(), ["application/json"]);
    assert_eq!(c.stability_for("get"), "production");
    assert_eq!(c.deprecation_for("get"), None);
    assert_eq!(c.module(), "test");
}

#[test]
fn test_literal_match_beats_wildcard() {
    let registry = ResourceRegistry::build(
        &[
            ResourceDeclaration::new("items/%", "items"),
            ResourceDeclaration::new("items/special", "other"),
        ],
        &catalog(),
        &ApiConfig::default(),
    )
    .unwrap();

    let found = registry.lookup("items/special").unwrap();
    assert_eq!(found.handler().name(), "other");
    let found = registry.lookup("/items/7/").unwrap();
    assert_eq!(found.handler().name(), "items");
}

#[test]
fn test_first_registered_wildcard_wins() {
    let registry = ResourceRegistry::build(
        &[
            ResourceDeclaration::new("%/detail", "other"),
            ResourceDeclaration::new("items/%", "items"),
        ],
        &catalog(),
        &ApiConfig::default(),
    )
    .unwrap();

    assert_eq!(registry.lookup("items/detail").unwrap().path(), "%/detail");
    assert!(registry.lookup("unknown/path/here").is_none());
}

#[test]
fn test_unknown_handler_fails_bootstrap() {
    let err = ResourceRegistry::build(
        &[ResourceDeclaration::new("items", "nope")],
        &catalog(),
        &ApiConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::ClassNotValid {
            path: "items".into(),
            handler: "nope".into()
        }
    );
}

#[test]
fn test_unknown_auth_and_config_fail_bootstrap() {
    let catalog = catalog();
    let err = ResourceRegistry::build(
        &[ResourceDeclaration::new("items", "items").auth("oauth")],
        &catalog,
        &ApiConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::AuthClassNotValid { .. }));

    let err = ResourceRegistry::build(
        &[ResourceDeclaration::new("items", "items").config("custom")],
        &catalog,
        &ApiConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotValid { .. }));
}

#[test]
fn test_duplicate_effective_path_is_rejected() {
    let err = ResourceRegistry::build(
        &[
            ResourceDeclaration::new("items", "items"),
            ResourceDeclaration::new("/items/", "other"),
        ],
        &catalog(),
        &ApiConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::DuplicatePath("items".into()));
}

#[test]
fn test_custom_config_factory() {
    let mut catalog = catalog();
    catalog.register_config(
        "json_only",
        Arc::new(
            |parts: ConfigParts| -> Result<Arc<dyn ResourceConfig>, ConfigError> {
                let config = ResourceConfiguration::new(parts)?
                    .with_versioned_types(vec!["application/vnd.items+json".to_string()]);
                Ok(Arc::new(config))
            },
        ),
    );

    let registry = ResourceRegistry::build(
        &[ResourceDeclaration::new("items", "items").config("json_only")],
        &catalog,
        &ApiConfig::default(),
    )
    .unwrap();
    assert_eq!(
        registry.lookup("items").unwrap().versioned_types(),
        ["application/vnd.items+json"]
    );
}

#[test]
fn test_fallback_resource_binds_unknown_handlers() {
    let mut catalog = Catalog::new();
    catalog.set_fallback_resource(EchoResource::handler("echo"));
    let registry = ResourceRegistry::build(
        &[ResourceDeclaration::new("anything", "unregistered")],
        &catalog,
        &ApiConfig::default(),
    )
    .unwrap();
    let handler: &Arc<dyn ResourceHandler> = registry.lookup("anything").unwrap().handler();
    assert_eq!(handler.name(), "echo");
}

#[test]
fn test_declarations_keep_document_order() {
    let yaml = r"
zeta:
  handler: items
alpha/%:
  handler: other
  module: shop
  auth: allow_all
";
    let decls: Declarations = serde_yaml::from_str(yaml).unwrap();
    let paths: Vec<&str> = decls.0.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, ["zeta", "alpha/%"]);
    assert_eq!(decls.0[1].module, "shop");
    assert_eq!(decls.0[1].auth.as_deref(), Some("allow_all"));
    assert_eq!(decls.0[0].auth, None);
}
