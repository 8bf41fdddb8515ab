//! mcadmin CLI - flush and inspect a memcached cluster from the terminal

mod command;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use command::MemcachedArgs;
use mcadmin_common::{AdminConfig, CacheAdmin, MemcacheClient};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "mcadmin", version, about = "Memcached administration console")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "MCADMIN_CONFIG", default_value = "mcadmin.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and flush memcached.
    ///
    /// This command allows manage the memcached tool: per-server statistics
    /// by default, or a full cache flush with --flush.
    #[command(name = "command:memcached")]
    Memcached(MemcachedArgs),
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so tables on stdout stay clean. Failures are already
    // reported on the console, so nothing is logged unless RUST_LOG asks for it.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::OFF.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Memcached(args) => {
            let admin = connect(&config);
            Ok(command::execute(&admin, &args, &config.command))
        }
    }
}

fn connect(config: &AdminConfig) -> CacheAdmin {
    match MemcacheClient::new(&config.memcached) {
        Ok(client) => CacheAdmin::new(Arc::new(client)),
        Err(e) => {
            debug!("Memcached client not configured: {}", e);
            CacheAdmin::unbound()
        }
    }
}
