//! hoard CLI - stream files into a cache as cancellable export jobs.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "hoard")]
#[command(about = "Stream files into a cache as cancellable export jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a file into the cache and follow it to completion
    Export {
        /// File to export
        file: PathBuf,

        /// Id of the user running the export
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Permissions held by the user (repeatable)
        #[arg(short, long = "permission", default_value = "exporter")]
        permissions: Vec<String>,

        /// Permission required to start an export
        #[arg(long, default_value = "exporter")]
        require: String,

        /// Redis URL (defaults to an in-process cache)
        #[arg(long, env = "HOARD_REDIS_URL")]
        redis_url: Option<String>,

        /// Read chunk size in bytes
        #[arg(long, default_value = "8192")]
        chunk_size: usize,

        /// Status poll interval in milliseconds
        #[arg(long, default_value = "100")]
        poll: u64,

        /// Cancel the export after this many milliseconds
        #[arg(long)]
        cancel_after: Option<u64>,

        /// Expiration of the finished job's keys, in seconds
        #[arg(long, default_value = "3600")]
        ttl: u64,
    },

    /// Show the stored status of an export
    Status {
        /// Export id
        id: String,

        /// Redis URL holding the export
        #[arg(long, env = "HOARD_REDIS_URL")]
        redis_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Export {
            file,
            user,
            permissions,
            require,
            redis_url,
            chunk_size,
            poll,
            cancel_after,
            ttl,
        } => {
            let options = commands::export::ExportOptions {
                file,
                user,
                permissions,
                required_permission: require,
                redis_url,
                chunk_size,
                poll_ms: poll,
                cancel_after_ms: cancel_after,
                ttl_secs: ttl,
                quiet: cli.quiet,
            };
            commands::export::export(options).await
        }
        Commands::Status { id, redis_url } => commands::status::status(&id, redis_url).await,
    }
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn initialize_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
