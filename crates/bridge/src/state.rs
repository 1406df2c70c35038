//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BridgeConfig;
use crate::source::{SourceClient, SourceError};
use crate::store::PgSyncStore;
use crate::sync::{BatchCoordinator, RegionTable, SyncReport, SyncRequest};
use crate::target::{TargetClient, TargetError};

/// Error building the platform clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("source client: {0}")]
    Source(#[from] SourceError),
    #[error("target client: {0}")]
    Target(#[from] TargetError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    regions: RegionTable,
    pool: PgPool,
    source: SourceClient,
    target: TargetClient,
    store: PgSyncStore,
}

impl AppState {
    /// Create the application state and its platform clients.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: BridgeConfig, pool: PgPool) -> Result<Self, StateError> {
        let source = SourceClient::new(&config.magento)?;
        let target = TargetClient::new(&config.gama)?;
        let store = PgSyncStore::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                regions: config.regions,
                pool,
                source,
                target,
                store,
            }),
        })
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Run a sync request against the configured platforms.
    pub async fn run_sync(&self, request: &SyncRequest) -> SyncReport {
        let inner = &*self.inner;
        BatchCoordinator::new(&inner.source, &inner.target, &inner.store, &inner.regions)
            .run(request)
            .await
    }
}
