use tracing::{error, info, warn};

use super::Hook;
use crate::error::ApiError;
use crate::registry::ResourceConfig;
use crate::request::Request;
use crate::response::Response;

/// Logs every lifecycle event; never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl Hook for TracingHook {
    fn on_request(&self, path: &str, config: &dyn ResourceConfig, req: &Request) -> Option<Request> {
        info!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %path,
            pattern = %config.path(),
            resource = %config.handler().name(),
            version = req.version(),
            "Dispatching request"
        );
        None
    }

    fn on_response(
        &self,
        path: &str,
        config: &dyn ResourceConfig,
        req: &Request,
        res: &Response,
    ) -> Option<Response> {
        info!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %path,
            resource = %config.handler().name(),
            status = res.status,
            "Request completed"
        );
        None
    }

    fn on_error(&self, err: &ApiError, res: Option<&Response>) -> Option<Response> {
        if err.status() >= 500 {
            error!(
                code = %err.code(),
                status = err.status(),
                error = %err,
                has_response = res.is_some(),
                "Request failed"
            );
        } else {
            warn!(
                code = %err.code(),
                status = err.status(),
                error = %err,
                has_response = res.is_some(),
                "Request rejected"
            );
        }
        None
    }
}
