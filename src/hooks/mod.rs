mod core;
mod deprecation;
mod request_id;
mod tracing;

pub use self::core::Hook;
pub use self::deprecation::DeprecationHook;
pub use self::request_id::RequestIdHook;
pub use self::tracing::TracingHook;
