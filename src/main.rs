//! settings-watch CLI.
//!
//! Reads and writes settings in the configured storage area, merging stored
//! values over the defaults from the config file.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use settings_watch::config::Config;

#[derive(Parser)]
#[command(name = "settings-watch")]
#[command(version, about = "Typed settings over key-value storage", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/settings-watch/settings.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current value of settings, falling back to defaults
    Get {
        /// Keys to read (all configured defaults if omitted)
        keys: Vec<String>,
    },
    /// Store settings as KEY=VALUE pairs (VALUE is JSON, or a plain string)
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Remove stored values so the defaults apply again
    Reset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the configured defaults
    Defaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    for warning in config.validate().warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Commands::Get { keys } => commands::read::get(&config, keys).await,
        Commands::Set { assignments } => commands::write::set(&config, &assignments).await,
        Commands::Reset { keys } => commands::write::reset(&config, keys).await,
        Commands::Defaults => commands::read::defaults(&config),
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_logging(verbose: u8, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
