//! Straight payment gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!   ~/.straight/config.yml ──▶ config ──▶ logging
//!                               │
//!                               ▼
//!                      db (connect, migrate)
//!                               │
//!                               ▼
//!   addons.yml ──▶ addons ──▶ routing (RouteTable)
//!                               │
//!                               ▼
//!   Client Request ──────▶ http server ──▶ first matching handler
//! ```

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use straight_gateway::addons::{AddonLoader, AddonRegistry};
use straight_gateway::config::default_config_dir;
use straight_gateway::db::{SqlxDriver, SqlxMigrator};
use straight_gateway::lifecycle::{signals, start_metrics};
use straight_gateway::{Startup, StartupError, StartupPaths};

#[derive(Debug, Parser)]
#[command(name = "straight-gateway", version, about = "Straight payment gateway server")]
struct Cli {
    /// Configuration directory (defaults to ~/.straight)
    #[arg(long, env = "STRAIGHT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Directory of migration definitions (defaults to the bundled ones)
    #[arg(long, env = "STRAIGHT_MIGRATIONS_DIR")]
    migrations_dir: Option<PathBuf>,

    /// Address the HTTP server listens on
    #[arg(long, env = "STRAIGHT_BIND", default_value = "0.0.0.0:9696")]
    bind: SocketAddr,

    /// Expose Prometheus metrics on this address
    #[arg(long, env = "STRAIGHT_METRICS_ADDRESS")]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StartupError::FirstRun { .. }) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("\x1b[1;31mERROR!\x1b[0m {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let paths = StartupPaths::new(cli.config_dir.unwrap_or_else(default_config_dir));
    let config_dir = paths.config_dir.clone();
    let migrator = match cli.migrations_dir {
        Some(dir) => SqlxMigrator::from_dir(dir),
        None => SqlxMigrator::bundled(),
    };

    let mut server = Startup::new(paths, SqlxDriver::default(), migrator)
        .prepare(&mut io::stdout())
        .await?;

    tracing::info!("straight-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let loader = AddonLoader::new(AddonRegistry::with_builtins(), config_dir);
    server.load_addons(&loader)?;

    start_metrics(cli.metrics_address)?;

    let listener = TcpListener::bind(cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let (shutdown, stopped) = broadcast::channel(1);
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    server.serve(listener, stopped).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
