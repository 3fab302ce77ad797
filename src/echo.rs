use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::resource::{Resource, ResourceContext, ResourceHandler, ResourceType};
use crate::response::Response;

/// A resource that answers every verb by echoing the call back.
///
/// Used by the CLI to exercise a declaration file without the real handlers,
/// and handy as a stand-in resource in tests.
pub struct EchoResource {
    ctx: ResourceContext,
}

impl Resource for EchoResource {
    fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ResourceContext {
        &mut self.ctx
    }
}

impl EchoResource {
    /// Method table registered under `name`, with `get`, `post`, `put`,
    /// `patch` and `delete`.
    pub fn handler(name: &str) -> Arc<dyn ResourceHandler> {
        ["get", "post", "put", "patch", "delete"]
            .into_iter()
            .fold(
                ResourceType::new(name, |ctx| EchoResource { ctx }),
                |table, verb| table.method(verb, EchoResource::echo),
            )
            .into_handler()
    }

    fn echo(&mut self, args: &[String]) -> Result<Response, ApiError> {
        let req = self.request();
        Ok(self.to_json(
            json!({
                "method": req.method().as_str(),
                "path": req.path(),
                "args": args,
                "query": Value::Object(req.query_params().clone()),
                "body": Value::Object(req.parsed_body().clone()),
                "request_id": req.request_id().as_str(),
            }),
            200,
        ))
    }
}
