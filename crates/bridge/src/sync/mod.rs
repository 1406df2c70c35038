//! Reconciliation engine.
//!
//! - [`credential`]: decides whether a credential must be pushed
//! - [`address`]: maps addresses and splits them into create/update
//! - [`user`]: syncs one user
//! - [`batch`]: runs a whole request and builds the report
//!
//! The engine only talks to the outside through [`SourceDirectory`],
//! [`TargetDirectory`] and [`SyncStore`].
//!
//! [`SourceDirectory`]: crate::source::SourceDirectory
//! [`TargetDirectory`]: crate::target::TargetDirectory
//! [`SyncStore`]: crate::store::SyncStore

pub mod address;
pub mod batch;
pub mod credential;
mod regions;
pub mod user;

pub use address::{AddressPlan, AddressSyncIndex, map_address, partition_addresses};
pub use batch::BatchCoordinator;
pub use credential::{CredentialDecision, reconcile_credential};
pub use regions::RegionTable;
pub use user::{SyncError, SyncOutcome, UserSync};

use serde::{Deserialize, Deserializer, Serialize};

use profile_bridge_core::{Email, EncodedCredential, ResultLabel, SyncResult};

/// Body of a sync request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    /// Overwrite users that already exist on the Target and re-sync users
    /// already migrated.
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub users: Vec<RequestedUser>,
}

/// One user to sync.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestedUser {
    pub email: Email,
    /// Encoded credential; `hash` is accepted for older callers.
    #[serde(default, alias = "hash", deserialize_with = "blank_as_none")]
    pub credential: Option<EncodedCredential>,
}

impl RequestedUser {
    #[must_use]
    pub const fn new(email: Email, credential: Option<EncodedCredential>) -> Self {
        Self { email, credential }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<EncodedCredential>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(EncodedCredential::new))
}

/// Result of a sync request, one entry per synced (or skipped) user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub results: Vec<SyncResult>,
    pub legend: Vec<ResultLabel>,
}

impl SyncReport {
    #[must_use]
    pub fn new(results: Vec<SyncResult>) -> Self {
        Self {
            results,
            legend: ResultLabel::legend(),
        }
    }
}
