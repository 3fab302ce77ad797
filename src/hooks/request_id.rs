use super::Hook;
use crate::ids::REQUEST_ID_HEADER;
use crate::registry::ResourceConfig;
use crate::request::Request;
use crate::response::Response;

/// Echoes the request's correlation id in the `X-Request-Id` response header.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdHook;

impl Hook for RequestIdHook {
    fn on_response(
        &self,
        _path: &str,
        _config: &dyn ResourceConfig,
        req: &Request,
        res: &Response,
    ) -> Option<Response> {
        if res.get_header(REQUEST_ID_HEADER) == Some(req.request_id().as_str()) {
            return None;
        }
        Some(
            res.clone()
                .with_header(REQUEST_ID_HEADER, req.request_id().as_str()),
        )
    }
}
