use tracing::debug;

use super::Hook;
use crate::config::MAX_CURRENT_VERSION;
use crate::registry::ResourceConfig;
use crate::request::Request;
use crate::resource::PRODUCTION;
use crate::response::Response;
use crate::versioning::resolve_method;

/// Header carrying the stability of a non-production method.
pub const STABILITY_HEADER: &str = "x-api-stability";

/// Announces deprecated and non-production methods to clients.
///
/// Re-resolves the method that served the request and, from its metadata,
/// adds `Deprecation` (`version=N`, or `true`), `Warning` (the reason) and
/// `X-API-Stability` headers.
#[derive(Debug, Clone, Copy)]
pub struct DeprecationHook {
    current_version: u32,
}

impl DeprecationHook {
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version: current_version.clamp(1, MAX_CURRENT_VERSION),
        }
    }
}

impl Hook for DeprecationHook {
    fn on_response(
        &self,
        _path: &str,
        config: &dyn ResourceConfig,
        req: &Request,
        res: &Response,
    ) -> Option<Response> {
        let method = resolve_method(
            config.handler().as_ref(),
            &req.verb(),
            req.version(),
            self.current_version,
        )?;

        let deprecation = config.deprecation_for(&method);
        let stability = config.stability_for(&method);
        if deprecation.is_none() && stability == PRODUCTION {
            return None;
        }

        let mut res = res.clone();
        if let Some(deprecation) = deprecation {
            let value = match deprecation.version {
                Some(v) => format!("version={v}"),
                None => "true".to_string(),
            };
            res.set_header("deprecation", value);
            if let Some(reason) = deprecation.reason {
                res.set_header("warning", format!("299 - \"{reason}\""));
            }
        }
        if stability != PRODUCTION {
            res.set_header(STABILITY_HEADER, stability);
        }
        debug!(method = %method, "Deprecation headers added");
        Some(res)
    }
}
