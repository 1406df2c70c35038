//! Durable sync bookkeeping.
//!
//! Three keyed collections back the engine:
//!
//! - **history**: last [`SyncResult`] per requested email, used to skip users
//!   already migrated
//! - **addresses**: one [`AddressSyncRecord`] per `(email, source address id)`
//! - **credentials**: last credential successfully pushed per email
//!
//! All writes are upserts, last write wins.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgSyncStore;

use std::future::Future;

use thiserror::Error;

use profile_bridge_core::{Email, EncodedCredential, SourceAddressId, SyncResult, TargetProfileId};

/// Errors raised by a [`SyncStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("store database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be interpreted.
    #[error("store data corruption: {0}")]
    DataCorruption(String),

    /// The store cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key of an address record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressKey {
    pub email: Email,
    pub address_id: SourceAddressId,
}

impl AddressKey {
    #[must_use]
    pub const fn new(email: Email, address_id: SourceAddressId) -> Self {
        Self { email, address_id }
    }
}

/// Outcome of the last create/update attempt for one Source address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSyncRecord {
    pub key: AddressKey,
    /// Profile id assigned by the Target, if any.
    pub target_profile_id: Option<TargetProfileId>,
    pub success: bool,
}

/// Persistence used by the sync engine.
pub trait SyncStore: Sync {
    /// Last recorded result for `email`, exactly as it was reported.
    fn get_result(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<SyncResult>, StoreError>> + Send;

    /// Record the result reported for `email`.
    fn put_result(
        &self,
        email: &Email,
        result: &SyncResult,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Address record for `key`.
    fn get_address(
        &self,
        key: &AddressKey,
    ) -> impl Future<Output = Result<Option<AddressSyncRecord>, StoreError>> + Send;

    /// Insert or replace an address record.
    fn put_address(
        &self,
        record: &AddressSyncRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Last credential pushed for `email`.
    fn get_credential(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<EncodedCredential>, StoreError>> + Send;

    /// Record the credential pushed for `email`.
    fn put_credential(
        &self,
        email: &Email,
        credential: &EncodedCredential,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
