//! One-off sync command.
//!
//! Runs a sync request without the HTTP service and prints the report.
//!
//! # Usage
//!
//! ```bash
//! # Sync a request file (same body as POST /users/sync)
//! pb-cli sync --file request.json
//!
//! # Sync individual users, overwriting existing profile platform users
//! pb-cli sync -e buyer@shop.mx -e other@shop.mx --force
//!
//! # Dry-ish run that keeps bookkeeping in memory
//! pb-cli sync -e buyer@shop.mx --memory-store
//! ```
//!
//! Uses the same environment as the service (see `profile_bridge::config`).

use std::path::{Path, PathBuf};

use profile_bridge::config::{BridgeConfig, ConfigError};
use profile_bridge::db;
use profile_bridge::source::{SourceClient, SourceError};
use profile_bridge::store::{MemoryStore, PgSyncStore, SyncStore};
use profile_bridge::sync::{BatchCoordinator, RequestedUser, SyncReport, SyncRequest};
use profile_bridge::target::{TargetClient, TargetError};
use profile_bridge_core::{Email, EmailError};
use thiserror::Error;

/// Errors that can occur before the batch runs.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    ReadRequest {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid sync request: {0}")]
    InvalidRequest(serde_json::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Nothing to sync: pass --file or at least one --email")]
    NoUsers,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Source client error: {0}")]
    Source(#[from] SourceError),

    #[error("Target client error: {0}")]
    Target(#[from] TargetError),

    #[error("Failed to serialize report: {0}")]
    Output(serde_json::Error),
}

/// Arguments of `pb-cli sync`.
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub file: Option<PathBuf>,
    pub emails: Vec<String>,
    pub force: bool,
    pub memory_store: bool,
}

/// Build the request, run it and print the report as JSON.
///
/// # Errors
///
/// Returns error if the request cannot be built or the clients cannot be
/// created. Per-user failures are part of the printed report.
pub async fn run(args: SyncArgs) -> Result<(), SyncCommandError> {
    let request = build_request(&args)?;
    let config = BridgeConfig::from_env()?;

    let source = SourceClient::new(&config.magento)?;
    let target = TargetClient::new(&config.gama)?;

    let report = if args.memory_store {
        tracing::warn!("Using in-memory store, sync history will not be kept");
        run_with(&source, &target, &MemoryStore::new(), &config, &request).await
    } else {
        let pool = db::create_pool(&config.database_url).await?;
        run_with(&source, &target, &PgSyncStore::new(pool), &config, &request).await
    };

    let output = serde_json::to_string_pretty(&report).map_err(SyncCommandError::Output)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

async fn run_with<K: SyncStore>(
    source: &SourceClient,
    target: &TargetClient,
    store: &K,
    config: &BridgeConfig,
    request: &SyncRequest,
) -> SyncReport {
    BatchCoordinator::new(source, target, store, &config.regions)
        .run(request)
        .await
}

/// Request from `--file`, extended with any `--email` users.
fn build_request(args: &SyncArgs) -> Result<SyncRequest, SyncCommandError> {
    let mut request = match &args.file {
        Some(path) => read_request(path)?,
        None => SyncRequest::default(),
    };

    for raw in &args.emails {
        request
            .users
            .push(RequestedUser::new(Email::parse(raw)?, None));
    }
    request.force |= args.force;

    if request.users.is_empty() {
        return Err(SyncCommandError::NoUsers);
    }
    Ok(request)
}

fn read_request(path: &Path) -> Result<SyncRequest, SyncCommandError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| SyncCommandError::ReadRequest {
            path: path.display().to_string(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(SyncCommandError::InvalidRequest)
}
