use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_declarations, DeclarationFile};
use crate::dispatcher::Api;
use crate::echo::EchoResource;
use crate::registry::{Catalog, ResourceRegistry};
use crate::request::Params;

/// Command-line interface for the resource dispatcher
#[derive(Parser)]
#[command(name = "restapi")]
#[command(about = "Inspect and exercise REST resource declarations", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the registration table
    Routes {
        /// Declaration file (YAML, JSON or TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Dispatch a single call against echo handlers
    Call {
        /// Declaration file (YAML, JSON or TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, e.g. items/42
        #[arg(short, long)]
        path: String,

        /// JSON object merged into the request data
        #[arg(short, long)]
        data: Option<String>,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

/// Build an [`Api`] for a declaration file, with every handler bound to
/// [`EchoResource`] and the built-in hooks registered.
pub fn build_api(file: &DeclarationFile) -> Result<Api> {
    let settings = file.settings.clone().with_env();

    let mut catalog = Catalog::new();
    catalog.set_fallback_resource(EchoResource::handler("echo"));

    let registry = ResourceRegistry::build(&file.resources.0, &catalog, &settings)
        .context("Failed to build resource registry")?;

    Ok(Api::new(Arc::new(registry), settings).with_builtin_hooks())
}

pub(super) fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("Invalid header {raw:?}, expected `Name: value`"),
    }
}

pub(super) fn parse_data(raw: Option<&str>) -> Result<Params> {
    let Some(raw) = raw else {
        return Ok(Params::new());
    };
    match serde_json::from_str::<Value>(raw).context("Invalid --data JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {other}"),
    }
}

/// Execute a parsed command, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Routes { config } => {
            let file = load_declarations(config)?;
            let api = build_api(&file)?;
            writeln!(
                out,
                "[routes] prefix={} current_version={} count={}",
                api.config().url_prefix.as_deref().unwrap_or("-"),
                api.config().current_version,
                api.registry().len()
            )?;
            for (decl, resource) in file.resources.0.iter().zip(api.registry().iter()) {
                writeln!(
                    out,
                    "[route] {} -> {} module={} auth={}",
                    resource.path(),
                    decl.handler,
                    if decl.module.is_empty() { "-" } else { decl.module.as_str() },
                    decl.auth.as_deref().unwrap_or(&api.config().default_auth),
                )?;
            }
            Ok(())
        }
        Commands::Call {
            config,
            method,
            path,
            data,
            headers,
        } => {
            let file = load_declarations(config)?;
            let api = build_api(&file)?;
            let data = parse_data(data.as_deref())?;
            let headers = headers
                .iter()
                .map(|h| parse_header(h))
                .collect::<Result<Vec<_>>>()?;
            let header_refs: Vec<(&str, &str)> = headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();

            let response = api.call(method, path, data, &header_refs);

            writeln!(out, "HTTP {}", response.status)?;
            for (name, value) in &response.headers {
                writeln!(out, "{name}: {value}")?;
            }
            writeln!(out)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&response.body)?)?;
            Ok(())
        }
    }
}

/// Parse the process arguments and run.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}
