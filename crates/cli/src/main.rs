//! Profile Bridge CLI - migrations and one-off syncs.
//!
//! # Usage
//!
//! ```bash
//! # Run sync store migrations
//! pb-cli migrate
//!
//! # Sync users without the HTTP service
//! pb-cli sync -e buyer@shop.mx --force
//! pb-cli sync --file request.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Run a sync request and print the report

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "pb-cli")]
#[command(author, version, about = "Profile Bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sync users from the commerce platform into the profile platform
    Sync {
        /// JSON request file (same shape as the HTTP body)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Email to sync (repeatable)
        #[arg(short, long = "email")]
        emails: Vec<String>,

        /// Overwrite existing users and ignore sync history
        #[arg(long)]
        force: bool,

        /// Keep sync bookkeeping in memory instead of `PostgreSQL`
        #[arg(long)]
        memory_store: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "profile_bridge=info,pb_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync {
            file,
            emails,
            force,
            memory_store,
        } => {
            commands::sync::run(SyncArgs {
                file,
                emails,
                force,
                memory_store,
            })
            .await?;
        }
    }
    Ok(())
}
