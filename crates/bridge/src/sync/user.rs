//! Per-user sync.
//!
//! Looks the user up on the Target, applies the conflict policy, pushes the
//! user record and then its addresses.
//!
//! ```text
//! lookup ─┬─ 2+ matches ──────────────> MultipleTargetUsers
//!         ├─ 1 match, no force ───────> AlreadyExists
//!         ├─ 1 match, force ──> update ─┐
//!         └─ 0 matches ──────> create ──┴─> addresses ─> Created / Updated
//! ```

use thiserror::Error;
use tracing::{info, instrument, warn};

use profile_bridge_core::{
    Email, EmailError, EncodedCredential, SyncCode, TargetUserStatus, TargetUserType,
};

use super::RegionTable;
use super::address::{AddressSyncIndex, partition_addresses};
use super::credential::reconcile_credential;
use crate::source::{SourceError, SourceUser};
use crate::store::{AddressKey, AddressSyncRecord, StoreError, SyncStore};
use crate::target::{TargetDirectory, TargetError, TargetUserPayload};

/// Company assigned to users created by the bridge.
const DEFAULT_COMPANY_ID: &str = "0";

/// Successful end state of a user sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
}

impl SyncOutcome {
    #[must_use]
    pub const fn code(self) -> SyncCode {
        match self {
            Self::Created => SyncCode::Created,
            Self::Updated => SyncCode::Updated,
        }
    }
}

/// Why a user could not be synced. The message becomes the failure reason.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("more than one user found with this email ({count} matches)")]
    MultipleTargetUsers { count: u64 },

    #[error("user already exists, force required")]
    AlreadyExists,

    #[error("no user found on source system")]
    NotFoundOnSource,

    #[error("source user has an invalid email: {0}")]
    InvalidSourceEmail(EmailError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Syncs one Source user into the Target.
pub struct UserSync<'a, T, S> {
    target: &'a T,
    store: &'a S,
    regions: &'a RegionTable,
}

impl<'a, T, S> UserSync<'a, T, S>
where
    T: TargetDirectory,
    S: SyncStore,
{
    #[must_use]
    pub const fn new(target: &'a T, store: &'a S, regions: &'a RegionTable) -> Self {
        Self {
            target,
            store,
            regions,
        }
    }

    /// Sync `user`, whose own address is `email`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] for the conflict cases, for any Target call
    /// that fails, and when an updated address cannot be recorded.
    #[instrument(skip_all, fields(email = %email, force = force))]
    pub async fn sync(
        &self,
        email: &Email,
        user: &SourceUser,
        force: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let lookup = self.target.find_users_by_email(email).await?;

        let outcome = match lookup.match_count() {
            0 => {
                self.create_user(email, user).await?;
                SyncOutcome::Created
            }
            1 if !force => return Err(SyncError::AlreadyExists),
            1 => {
                let existing = lookup
                    .users
                    .first()
                    .ok_or_else(|| TargetError::MissingLookupUser(email.to_string()))?;
                let payload = user_payload(user, None);
                self.target.update_user(&existing.id, &payload).await?;
                info!(user_id = %existing.id, "Updated target user");
                SyncOutcome::Updated
            }
            count => return Err(SyncError::MultipleTargetUsers { count }),
        };

        self.sync_addresses(email, user).await?;
        Ok(outcome)
    }

    /// Create the Target user, then record its credential and default profile.
    async fn create_user(&self, email: &Email, user: &SourceUser) -> Result<(), SyncError> {
        let prior = self.prior_credential(email).await;
        let decision = reconcile_credential(user.credential.as_ref(), prior.as_ref());

        let mut payload = user_payload(user, decision.transmit);
        payload.company_id = Some(DEFAULT_COMPANY_ID.to_string());
        payload.user_type = Some(TargetUserType::Customer);

        let created = self.target.create_user(&payload).await?;
        info!(
            user_id = ?created.user_id,
            profile_id = created.profile_id.map(|id| id.as_i32()),
            "Created target user"
        );

        if let Some(credential) = decision.persist
            && let Err(e) = self.store.put_credential(email, &credential).await
        {
            warn!(error = %e, "Failed to record pushed credential");
        }

        if let Some(address_id) = user.default_shipping_id() {
            let profile_id = created.profile_id.filter(|id| id.is_set());
            let record = AddressSyncRecord {
                key: AddressKey::new(email.clone(), address_id),
                target_profile_id: profile_id,
                success: profile_id.is_some(),
            };
            if let Err(e) = self.store.put_address(&record).await {
                warn!(error = %e, address_id = %address_id, "Failed to record default profile");
            }
        }

        Ok(())
    }

    async fn prior_credential(&self, email: &Email) -> Option<EncodedCredential> {
        match self.store.get_credential(email).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(error = %e, "Credential record lookup failed, treating as absent");
                None
            }
        }
    }

    /// Create or update every address of the user and record the outcome.
    async fn sync_addresses(&self, email: &Email, user: &SourceUser) -> Result<(), SyncError> {
        let addresses = user.addresses.as_deref().unwrap_or_default();
        let index = AddressSyncIndex::load(self.store, email, addresses).await;
        let plan = partition_addresses(addresses, email, &index, self.regions);

        if !plan.to_create.is_empty() {
            let assigned = self.target.create_profiles(email, &plan.to_create).await?;
            for profile in &plan.to_create {
                let profile_id = assigned
                    .get(&profile.profile_name)
                    .copied()
                    .filter(|id| id.is_set());
                let record = AddressSyncRecord {
                    key: AddressKey::new(email.clone(), profile.profile_name),
                    target_profile_id: profile_id,
                    success: profile_id.is_some(),
                };
                if let Err(e) = self.store.put_address(&record).await {
                    warn!(
                        error = %e,
                        address_id = %profile.profile_name,
                        "Failed to record created profile"
                    );
                }
            }
        }

        if !plan.to_update.is_empty() {
            let flags = self.target.update_profiles(email, &plan.to_update).await?;
            for profile in &plan.to_update {
                let success = profile
                    .profile_id
                    .and_then(|id| flags.get(&id).copied())
                    .unwrap_or(false);
                let record = AddressSyncRecord {
                    key: AddressKey::new(email.clone(), profile.profile_name),
                    target_profile_id: profile.profile_id,
                    success,
                };
                self.store.put_address(&record).await?;
            }
        }

        info!(
            created = plan.to_create.len(),
            updated = plan.to_update.len(),
            "Synced addresses"
        );
        Ok(())
    }
}

/// User record pushed to the Target. Status is always active.
fn user_payload(user: &SourceUser, secret: Option<String>) -> TargetUserPayload {
    TargetUserPayload {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        status: TargetUserStatus::Active,
        company_id: None,
        user_type: None,
        secret,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use profile_bridge_core::{SourceAddressId, TargetProfileId};

    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::{FakeTarget, NEW_CREDENTIAL, customer, email};

    const BUYER: &str = "buyer@shop.mx";

    async fn run(
        target: &FakeTarget,
        store: &MemoryStore,
        force: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let regions = RegionTable::default();
        let mut user = customer(BUYER, &[12, 13], Some(12));
        user.credential = EncodedCredential::new(NEW_CREDENTIAL);
        UserSync::new(target, store, &regions)
            .sync(&email(BUYER), &user, force)
            .await
    }

    #[tokio::test]
    async fn test_two_matches_is_a_conflict() {
        let target = FakeTarget::new().with_existing(BUYER, 2);
        let store = MemoryStore::new();

        let err = run(&target, &store, true).await.unwrap_err();
        assert!(matches!(err, SyncError::MultipleTargetUsers { count: 2 }));
        assert!(err.to_string().contains("more than one user found"));
        assert_eq!(target.call_names(), vec!["lookup"]);
    }

    #[tokio::test]
    async fn test_existing_user_requires_force() {
        let target = FakeTarget::new().with_existing(BUYER, 1);
        let store = MemoryStore::new();

        let err = run(&target, &store, false).await.unwrap_err();
        assert_eq!(err.to_string(), "user already exists, force required");
        assert_eq!(target.call_names(), vec!["lookup"]);
    }

    #[tokio::test]
    async fn test_forced_update_never_sends_credential() {
        let target = FakeTarget::new().with_existing(BUYER, 1);
        let store = MemoryStore::new();

        let outcome = run(&target, &store, true).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(
            target.call_names(),
            vec!["lookup", "update_user", "create_profiles"]
        );
        let payload = target.last_user_payload().unwrap();
        assert_eq!(payload.secret, None);
        assert_eq!(payload.company_id, None);
    }

    #[tokio::test]
    async fn test_create_binds_default_profile_and_updates_it() {
        let target = FakeTarget::new();
        let store = MemoryStore::new();

        let outcome = run(&target, &store, false).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Created);

        let payload = target.last_user_payload().unwrap();
        assert_eq!(payload.company_id.as_deref(), Some("0"));
        assert_eq!(payload.user_type, Some(TargetUserType::Customer));
        assert_eq!(payload.secret.as_deref(), Some("new"));

        // Address 12 is the default shipping one and was bound on create.
        assert_eq!(
            target.call_names(),
            vec!["lookup", "create_user", "create_profiles", "update_profiles"]
        );
        let default = store
            .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(12)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.target_profile_id, Some(TargetProfileId::new(4410)));
        assert!(default.success);

        let other = store
            .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(13)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.target_profile_id, Some(TargetProfileId::new(5013)));

        assert!(store.get_credential(&email(BUYER)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_created_profile_missing_from_response_is_recorded_failed() {
        let mut target = FakeTarget::new().with_existing(BUYER, 1);
        target.unassigned_profiles = vec![SourceAddressId::new(13)];
        let store = MemoryStore::new();

        run(&target, &store, true).await.unwrap();

        let record = store
            .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(13)))
            .await
            .unwrap()
            .unwrap();
        assert!(!record.success);
        assert_eq!(record.target_profile_id, None);
    }

    #[tokio::test]
    async fn test_target_failure_aborts_user() {
        let mut target = FakeTarget::new();
        target.fail_create_user = true;
        let store = MemoryStore::new();

        let err = run(&target, &store, false).await.unwrap_err();
        assert!(matches!(err, SyncError::Target(TargetError::Api { status: 500, .. })));
        assert_eq!(store.address_count().unwrap(), 0);
        assert!(store.get_credential(&email(BUYER)).await.unwrap().is_none());
    }
}
