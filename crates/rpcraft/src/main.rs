// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RPCraft - conversation state with offline fallback.
//!
//! This is the binary entry point for the RPCraft CLI.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use rpcraft_config::RpcraftConfig;
use rpcraft_core::{ConversationStore, RpcraftError};
use rpcraft_local::LocalStore;
use rpcraft_remote::RemoteStore;
use rpcraft_sync::ConversationManager;

mod list;
mod migrate;
mod status;

/// RPCraft - conversation state with offline fallback.
#[derive(Parser, Debug)]
#[command(name = "rpcraft", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe the remote service and report the sync mode.
    Status,
    /// Replay queued offline writes against the remote service.
    Migrate,
    /// List conversations for the active system prompt.
    List {
        /// Include archived conversations.
        #[arg(long)]
        archived: bool,
    },
}

/// Builds the manager from config: the local snapshot always, the remote
/// client only when a base URL is configured.
pub(crate) fn build_manager(config: &RpcraftConfig) -> Result<ConversationManager, RpcraftError> {
    let local = Arc::new(LocalStore::open(&config.storage.snapshot_path)?);
    let remote: Option<Arc<dyn ConversationStore>> = match config.remote.base_url {
        Some(_) => Some(Arc::new(RemoteStore::new(&config.remote)?)),
        None => None,
    };
    Ok(ConversationManager::new(remote, local))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("RPCRAFT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("rpcraft={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => rpcraft_config::load_and_validate_path(path),
        None => rpcraft_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            rpcraft_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Commands::Status => status::run_status(&config).await,
        Commands::Migrate => migrate::run_migrate(&config).await,
        Commands::List { archived } => list::run_list(&config, archived).await,
    };
    if let Err(err) = result {
        eprintln!("rpcraft: {err}");
        std::process::exit(1);
    }
}
