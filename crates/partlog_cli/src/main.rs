//! partlog CLI
//!
//! Command-line front end for partitioned message logs.
//!
//! # Commands
//!
//! - `run` - Build a router from a config file and read commands from stdin;
//!   Ctrl-C closes every partition (flushing backing files) before exiting
//! - `inspect` - Display partition statistics without opening any partition
//! - `version` - Show version information

mod commands;
mod config;

use clap::{Parser, Subcommand};
use partlog_core::Router;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Partitioned message log tools.
#[derive(Parser)]
#[command(name = "partlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the router configuration (JSON)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin and apply them to the configured router
    Run,

    /// Display partition statistics (read-only)
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn build_router(path: Option<PathBuf>) -> Result<Router<String>, Box<dyn std::error::Error>> {
    let router = match path {
        Some(path) => {
            let configs = config::load(&path)?;
            info!(config = ?path, partitions = configs.len(), "loaded configuration");
            Router::from_configs(configs)?
        }
        None => {
            info!("no configuration given; starting with an empty router");
            Router::new()
        }
    };
    Ok(router)
}

/// Exit status after an interrupt (128 + SIGINT).
const INTERRUPTED: i32 = 130;

/// Watches for Ctrl-C on a background thread and closes `router` before
/// exiting.
fn close_on_interrupt(router: Arc<Router<String>>) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("partlog-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!(error = %err, "cannot listen for Ctrl-C");
                    return;
                }
                info!("Received SIGINT, closing partitions");
                if let Err(err) = commands::session::shutdown(&router, "interrupt") {
                    error!(error = %err, "close after interrupt failed");
                }
                std::process::exit(INTERRUPTED);
            });
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run => {
            let router = Arc::new(build_router(cli.config)?);
            close_on_interrupt(Arc::clone(&router))?;
            commands::session::run(&router, io::stdin().lock(), io::stdout().lock())?;
            commands::session::shutdown(&router, "end of session")?;
        }
        Commands::Inspect { format } => {
            let path = cli.config.ok_or("Config path required for inspect")?;
            let configs = config::load(&path)?;
            commands::inspect::run(&configs, &format, &mut io::stdout().lock())?;
        }
        Commands::Version => {
            println!("partlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("partlog Core v{}", partlog_core::VERSION);
        }
    }

    Ok(())
}
