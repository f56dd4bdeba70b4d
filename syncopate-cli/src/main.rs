//! syncopate - command-line front-end for the Syncopate concert app
//!
//! Every command runs against a fresh cookie jar, so commands that need a
//! session log in first with `--username`/`--password` (or the matching
//! environment variables).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use syncopate_client::{ClientContext, Gateway, HttpGateway};
use syncopate_common::config::{default_config_path, load_toml_config, resolve_api_base_url};
use syncopate_common::events::EventBus;
use tracing::info;

mod commands;

use commands::{Command, Credentials};

/// Command-line arguments for syncopate
#[derive(Parser, Debug)]
#[command(name = "syncopate")]
#[command(about = "Find concerts and people to go with")]
#[command(version)]
struct Args {
    /// Backend API root (overrides SYNCOPATE_API_BASE and the config file)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Config file path
    #[arg(long, global = true, env = "SYNCOPATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter, e.g. `debug` or `syncopate_client=trace`
    #[arg(long, global = true, env = "SYNCOPATE_LOG")]
    log_level: Option<String>,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = config_path
        .as_deref()
        .map(load_toml_config)
        .unwrap_or_default();

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting syncopate v{}", env!("CARGO_PKG_VERSION"));

    if let Command::Config(cmd) = &args.command {
        let path = config_path.context("No config directory on this platform")?;
        return commands::config::run(cmd, &path, &toml_config);
    }

    let api_base = resolve_api_base_url(args.api_base.as_deref(), &toml_config)
        .context("Invalid API base URL")?;
    let gateway: Arc<dyn Gateway> =
        Arc::new(HttpGateway::new(&api_base).context("Failed to build HTTP client")?);
    let ctx = ClientContext::new(gateway, Arc::new(EventBus::default()));

    commands::run(args.command, &args.credentials, &toml_config, ctx).await
}
