//! # CLI Module
//!
//! Command-line access to a declaration file, with every declared handler
//! bound to [`EchoResource`](crate::echo::EchoResource).
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the registration table, in registration order:
//!
//! ```bash
//! restapi routes --config resources.yaml
//! ```
//!
//! ### `call`
//!
//! Dispatch one call and print the status, headers and JSON body:
//!
//! ```bash
//! restapi call --config resources.yaml --method POST --path items/42 \
//!     --data '{"name": "widget"}' \
//!     --header 'Accept: application/json; version=2'
//! ```
//!
//! `RESTAPI_*` environment variables override the file's `settings`.

mod commands;


pub use commands::{build_api, run, run_cli, Cli, Commands};
