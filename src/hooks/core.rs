use crate::error::ApiError;
use crate::registry::ResourceConfig;
use crate::request::Request;
use crate::response::Response;

/// Extension points of the call lifecycle.
///
/// Every registered hook is offered every event, in registration order.
/// Returning `Some` replaces the in-flight value for the hooks that follow and
/// for the rest of the call; `None` leaves it unchanged.
pub trait Hook: Send + Sync {
    /// Before the handler is instantiated. May replace the request.
    fn on_request(&self, _path: &str, _config: &dyn ResourceConfig, _req: &Request) -> Option<Request> {
        None
    }

    /// After the response is final. `req` is a snapshot of the request the
    /// handler saw. May replace the response.
    fn on_response(
        &self,
        _path: &str,
        _config: &dyn ResourceConfig,
        _req: &Request,
        _res: &Response,
    ) -> Option<Response> {
        None
    }

    /// When the call failed. `res` is the partial response, if one was built or
    /// already supplied by an earlier hook. May supply the response to render.
    fn on_error(&self, _err: &ApiError, _res: Option<&Response>) -> Option<Response> {
        None
    }
}
