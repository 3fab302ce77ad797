//! # Versioning Module
//!
//! Additive API versioning. A handler type exposes unsuffixed methods (`get`)
//! and, optionally, versioned variants (`getV2`, `getV3`). A request asking for
//! version `v` against a server ceiling `C` resolves to the highest variant at
//! or below `min(v, C)`, falling back to the unsuffixed method.
//!
//! ```rust
//! use restapi::versioning::resolve_versioned_method;
//!
//! let exposed = ["getV1", "getV2", "get"];
//! let exists = |name: &str| exposed.contains(&name);
//!
//! assert_eq!(resolve_versioned_method("get", 2, 3, exists).as_deref(), Some("getV2"));
//! assert_eq!(resolve_versioned_method("get", 5, 3, exists).as_deref(), Some("getV2"));
//! assert_eq!(resolve_versioned_method("get", 1, 3, exists).as_deref(), Some("getV1"));
//! assert_eq!(resolve_versioned_method("post", 1, 3, exists), None);
//! ```

use crate::resource::ResourceHandler;

/// Verbs checked, in order, when computing the `Allow` header.
pub const CANDIDATE_VERBS: [&str; 5] = ["DELETE", "GET", "POST", "PUT", "OPTIONS"];

/// Name of the generic access check.
pub const GENERIC_ACCESS: &str = "access";

/// `base` suffixed with the version, e.g. `getV2`.
#[must_use]
pub fn versioned_name(base: &str, version: u32) -> String {
    format!("{base}V{version}")
}

/// Resolve `base` against the version cascade.
///
/// Tries `baseV{min(version, ceiling)}` down to `baseV1`, then `base` itself.
/// Returns `None` when nothing exists.
pub fn resolve_versioned_method<F>(base: &str, version: u32, ceiling: u32, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let effective = version.min(ceiling);
    (1..=effective)
        .rev()
        .map(|v| versioned_name(base, v))
        .find(|name| exists(name))
        .or_else(|| exists(base).then(|| base.to_string()))
}

/// Base name of the verb-specific access check: `get` -> `accessGet`.
#[must_use]
pub fn access_method_name(verb: &str) -> String {
    let verb = verb.to_ascii_lowercase();
    let mut chars = verb.chars();
    match chars.next() {
        Some(first) => format!("{GENERIC_ACCESS}{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => GENERIC_ACCESS.to_string(),
    }
}

/// Resolve a business method of `handler` for `verb`.
#[must_use]
pub fn resolve_method(
    handler: &dyn ResourceHandler,
    verb: &str,
    version: u32,
    ceiling: u32,
) -> Option<String> {
    resolve_versioned_method(&verb.to_ascii_lowercase(), version, ceiling, |name| {
        handler.has_method(name)
    })
}

/// Resolve the verb-specific access check of `handler` for `verb`.
#[must_use]
pub fn resolve_access_check(
    handler: &dyn ResourceHandler,
    verb: &str,
    version: u32,
    ceiling: u32,
) -> Option<String> {
    resolve_versioned_method(&access_method_name(verb), version, ceiling, |name| {
        handler.has_access_check(name)
    })
}

/// Verbs answerable by `handler` at this version, in [`CANDIDATE_VERBS`] order.
///
/// `OPTIONS` is always included since a built-in answer exists for it.
#[must_use]
pub fn allowed_methods(handler: &dyn ResourceHandler, version: u32, ceiling: u32) -> Vec<&'static str> {
    CANDIDATE_VERBS
        .iter()
        .copied()
        .filter(|verb| *verb == "OPTIONS" || resolve_method(handler, verb, version, ceiling).is_some())
        .collect()
}
