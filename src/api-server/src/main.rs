//! Demo orders service guarded by authx
//!
//! ```bash
//! # Built-in demo configuration on 0.0.0.0:8080
//! cargo run -p authx-server
//!
//! # Custom policy/token file
//! cargo run -p authx-server -- --config ./authx.toml --port 9090
//!
//! # Watch pipeline decisions
//! RUST_LOG=authx_authz=debug,authx_server=debug cargo run -p authx-server
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use authx_server::{server::ServerBuilder, AppState, ServerFileConfig};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "authx-server",
    version,
    about = "Orders service demonstrating the authx policy pipeline",
    long_about = None
)]
struct Args {
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "AUTHX_HOST")]
    host: String,

    #[arg(short = 'p', long, default_value = "8080", env = "AUTHX_PORT")]
    port: u16,

    /// Policy, token and order file (TOML); the built-in demo is used when absent
    #[arg(short = 'c', long, env = "AUTHX_CONFIG")]
    config: Option<PathBuf>,

    /// Enable JSON logging format
    #[arg(long, env = "AUTHX_JSON_LOGS")]
    json_logs: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting authx-server");

    let config = match &args.config {
        Some(path) => ServerFileConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            info!("No --config given, using the built-in demo configuration");
            ServerFileConfig::demo().context("Failed to load demo configuration")?
        }
    };

    let state = AppState::from_config(&config).context("Invalid authx configuration")?;

    let server = ServerBuilder::new()
        .host(&args.host)
        .port(args.port)
        .state(state)
        .build()?;

    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn default_filter(log_level: &str) -> String {
    let level = log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    // `Level` orders by verbosity, TRACE being the greatest
    let deps = if level >= tracing::Level::DEBUG {
        "debug"
    } else {
        "info"
    };

    format!(
        "authx_server={level},authx_authz={level},tower_http={deps},axum={deps}",
        level = level.as_str().to_ascii_lowercase(),
        deps = deps
    )
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&args.log_level)));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}
