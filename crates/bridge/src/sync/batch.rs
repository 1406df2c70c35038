//! Batch coordinator: runs a [`SyncRequest`] user by user.

use tracing::{info, instrument, warn};

use profile_bridge_core::{Email, SyncResult};

use super::user::{SyncError, UserSync};
use super::{RegionTable, RequestedUser, SyncReport, SyncRequest};
use crate::source::SourceDirectory;
use crate::store::SyncStore;
use crate::target::TargetDirectory;

/// Runs sync requests against one Source, one Target and one store.
///
/// Users are processed in request order, one at a time. A failing user is
/// reported and the batch moves on.
pub struct BatchCoordinator<'a, S, T, K> {
    source: &'a S,
    target: &'a T,
    store: &'a K,
    regions: &'a RegionTable,
}

impl<'a, S, T, K> BatchCoordinator<'a, S, T, K>
where
    S: SourceDirectory,
    T: TargetDirectory,
    K: SyncStore,
{
    #[must_use]
    pub const fn new(source: &'a S, target: &'a T, store: &'a K, regions: &'a RegionTable) -> Self {
        Self {
            source,
            target,
            store,
            regions,
        }
    }

    /// Sync every requested user and collect the results.
    #[instrument(skip_all, fields(users = request.users.len(), force = request.force))]
    pub async fn run(&self, request: &SyncRequest) -> SyncReport {
        let mut results = Vec::with_capacity(request.users.len());
        for requested in &request.users {
            self.sync_requested(requested, request.force, &mut results)
                .await;
        }
        info!(results = results.len(), "Sync batch complete");
        SyncReport::new(results)
    }

    async fn sync_requested(
        &self,
        requested: &RequestedUser,
        force: bool,
        results: &mut Vec<SyncResult>,
    ) {
        let email = &requested.email;

        if !force && let Some(cached) = self.history(email).await {
            info!(email = %email, code = cached.code.as_u8(), "Already migrated, reusing result");
            results.push(cached);
            return;
        }

        let found = match self.source.find_users_by_email(email).await {
            Ok(found) => found,
            Err(e) => {
                let result = SyncResult::failure(email.as_str(), SyncError::from(e).to_string());
                self.record(email, result, results).await;
                return;
            }
        };

        if found.items.is_empty() {
            let result =
                SyncResult::failure(email.as_str(), SyncError::NotFoundOnSource.to_string());
            self.record(email, result, results).await;
            return;
        }

        let users = UserSync::new(self.target, self.store, self.regions);
        for mut user in found.items {
            user.credential.clone_from(&requested.credential);
            let synced = match Email::parse(&user.email) {
                Ok(user_email) => users.sync(&user_email, &user, force).await,
                Err(e) => Err(SyncError::InvalidSourceEmail(e)),
            };
            let result = match synced {
                Ok(outcome) => SyncResult::success(&user.email, outcome.code()),
                Err(e) => {
                    warn!(
                        email = %email,
                        source_email = %user.email,
                        error = %e,
                        "User sync failed"
                    );
                    SyncResult::failure(&user.email, e.to_string())
                }
            };
            self.record(email, result, results).await;
        }
    }

    /// A migrated result from history, if any. Read failures count as no history.
    async fn history(&self, email: &Email) -> Option<SyncResult> {
        match self.store.get_result(email).await {
            Ok(cached) => cached.filter(|cached| cached.code.is_migrated()),
            Err(e) => {
                warn!(email = %email, error = %e, "History lookup failed, syncing anyway");
                None
            }
        }
    }

    async fn record(&self, email: &Email, result: SyncResult, results: &mut Vec<SyncResult>) {
        info!(email = %email, code = result.code.as_u8(), "User synced");
        if let Err(e) = self.store.put_result(email, &result).await {
            warn!(email = %email, error = %e, "Failed to record sync result");
        }
        results.push(result);
    }
}
