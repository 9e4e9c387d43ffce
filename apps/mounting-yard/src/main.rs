use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;

use context::Context;

#[derive(Parser)]
#[command(name = "yard")]
#[command(about = "Connect to remote file shares without waiting on them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors (command results are still printed)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (defaults to ~/.config/mounting-yard/config.json)
    #[arg(long, env = "MOUNTING_YARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the endpoint files
    #[arg(long, env = "MOUNTING_YARD_ENDPOINTS_DIR", global = true)]
    endpoints_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved endpoints
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save a new endpoint
    Add {
        /// Display name, also used as the file name
        name: String,

        /// Share address, e.g. smb://server/share
        address: String,

        /// Account to connect as
        #[arg(short, long, conflicts_with = "guest")]
        username: Option<String>,

        /// Connect as guest
        #[arg(short, long)]
        guest: bool,
    },

    /// Delete an endpoint
    Remove {
        name: String,
    },

    /// Change an endpoint
    Edit {
        name: String,

        /// New address
        #[arg(long)]
        address: Option<String>,

        /// New account name (empty to clear)
        #[arg(short, long)]
        username: Option<String>,

        /// Connect as guest from now on
        #[arg(long, conflicts_with = "no_guest")]
        guest: bool,

        /// Stop connecting as guest
        #[arg(long)]
        no_guest: bool,

        /// New display name
        #[arg(long)]
        rename: Option<String>,
    },

    /// Connect one or more endpoints
    Connect {
        #[arg(required = true)]
        names: Vec<String>,

        /// Return as soon as the requests are issued
        #[arg(long)]
        no_wait: bool,

        /// Seconds to wait for results (defaults to the mount timeout plus a grace period)
        #[arg(long, conflicts_with = "no_wait")]
        timeout: Option<u64>,
    },

    /// Show connection state, re-checking recorded mount points
    Status {
        /// Only this endpoint
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write all endpoints to an export file
    Export {
        path: PathBuf,
    },

    /// Merge endpoints from an export file, keeping existing names
    Import {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    debug!("Starting yard v{}", env!("CARGO_PKG_VERSION"));

    let ctx = Context::load(cli.config, cli.endpoints_dir)?;

    match cli.command {
        Commands::List { json } => commands::list::execute(ctx, json),
        Commands::Add {
            name,
            address,
            username,
            guest,
        } => commands::add::execute(ctx, name, address, username, guest),
        Commands::Remove { name } => commands::remove::execute(ctx, &name),
        Commands::Edit {
            name,
            address,
            username,
            guest,
            no_guest,
            rename,
        } => {
            let guest = match (guest, no_guest) {
                (true, _) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            };
            commands::edit::execute(
                ctx,
                &name,
                commands::edit::Changes {
                    address,
                    username,
                    guest,
                    rename,
                },
            )
        }
        Commands::Connect {
            names,
            no_wait,
            timeout,
        } => commands::connect::execute(ctx, names, no_wait, timeout).await,
        Commands::Status { name, json } => commands::status::execute(ctx, name.as_deref(), json),
        Commands::Export { path } => commands::transfer::export(ctx, &path),
        Commands::Import { path } => commands::transfer::import(ctx, &path),
    }
}
