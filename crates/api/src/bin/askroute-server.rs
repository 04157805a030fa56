//! askroute binary entry point
//!
//! Loads configuration, builds the assistant once and serves the HTTP API.
//! `ask` runs a single query in-process and prints the JSON outcome.

use anyhow::Result;
use askroute_common::{Mode, QueryState, Role, SystemConfig};
use askroute_orchestrator::Assistant;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "askroute-server")]
#[command(version)]
#[command(about = "Role- and mode-aware question answering over web and internal sources")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Answer one query and print the response JSON
    Ask {
        query: String,

        #[arg(long, default_value = "learner")]
        role: Role,

        #[arg(long, default_value = "external")]
        mode: Mode,
    },
    /// Validate configuration
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.as_deref().unwrap_or("info");
    askroute_common::init_tracing_with_level(log_level)?;

    info!("askroute v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(&cli.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ValidateConfig => {
            println!("✓ Configuration is valid");
            println!("  Model: {} at {}", config.llm.model, config.llm.endpoint);
            println!("  Web search: {}", if config.web.enabled { config.web.endpoint.as_str() } else { "disabled" });
            println!("  YouTube: {}", configured(config.youtube.api_key.is_some()));
            println!("  GitHub: {}", configured(config.github.token.is_some()));
            println!("  Knowledge base: {}", configured(config.vector.url.is_some()));
            Ok(())
        }
        Commands::Ask { query, role, mode } => {
            let assistant = Assistant::from_config(&config).await?;
            let outcome = assistant.handle(&QueryState::new(role, mode, query)).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::Serve => {
            info!("Starting server on {}:{}", config.server.host, config.server.port);
            askroute_api::ApiServer::new(config).await?.run().await
        }
    }
}

/// File config when present, otherwise defaults; env credentials apply either way
fn load_config(path: &str) -> Result<SystemConfig> {
    if Path::new(path).exists() {
        return Ok(SystemConfig::load(path)?);
    }
    warn!("Configuration file {} not found, using defaults", path);
    let mut config = SystemConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "not configured"
    }
}
