//! In-process store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use profile_bridge_core::{Email, EncodedCredential, SyncResult};

use super::{AddressKey, AddressSyncRecord, StoreError, SyncStore};

/// [`SyncStore`] held in memory; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryTables>,
}

#[derive(Debug, Default)]
struct MemoryTables {
    results: HashMap<Email, SyncResult>,
    addresses: HashMap<AddressKey, AddressSyncRecord>,
    credentials: HashMap<Email, EncodedCredential>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, MemoryTables>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Number of address records held.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn address_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables()?.addresses.len())
    }
}

impl SyncStore for MemoryStore {
    async fn get_result(&self, email: &Email) -> Result<Option<SyncResult>, StoreError> {
        Ok(self.tables()?.results.get(email).cloned())
    }

    async fn put_result(&self, email: &Email, result: &SyncResult) -> Result<(), StoreError> {
        self.tables()?.results.insert(email.clone(), result.clone());
        Ok(())
    }

    async fn get_address(&self, key: &AddressKey) -> Result<Option<AddressSyncRecord>, StoreError> {
        Ok(self.tables()?.addresses.get(key).cloned())
    }

    async fn put_address(&self, record: &AddressSyncRecord) -> Result<(), StoreError> {
        self.tables()?
            .addresses
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn get_credential(&self, email: &Email) -> Result<Option<EncodedCredential>, StoreError> {
        Ok(self.tables()?.credentials.get(email).cloned())
    }

    async fn put_credential(
        &self,
        email: &Email,
        credential: &EncodedCredential,
    ) -> Result<(), StoreError> {
        self.tables()?
            .credentials
            .insert(email.clone(), credential.clone());
        Ok(())
    }
}
