//! Integration test support for Profile Bridge.
//!
//! Re-exports the bridge's in-process directories and fixtures, and adds a
//! store wrapper that can be told to fail. The scenarios themselves live in
//! `tests/`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p profile-bridge-integration-tests
//! ```

pub use profile_bridge::test_utils::*;

use profile_bridge::store::{AddressKey, AddressSyncRecord, MemoryStore, StoreError, SyncStore};
use profile_bridge_core::{Email, EncodedCredential, SyncResult};

/// [`MemoryStore`] with switchable failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
    pub fail_address_writes: bool,
    pub fail_result_writes: bool,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("injected failure".to_string())
}

impl SyncStore for FlakyStore {
    async fn get_result(&self, email: &Email) -> Result<Option<SyncResult>, StoreError> {
        if self.fail_reads {
            return Err(unavailable());
        }
        self.inner.get_result(email).await
    }

    async fn put_result(&self, email: &Email, result: &SyncResult) -> Result<(), StoreError> {
        if self.fail_result_writes {
            return Err(unavailable());
        }
        self.inner.put_result(email, result).await
    }

    async fn get_address(&self, key: &AddressKey) -> Result<Option<AddressSyncRecord>, StoreError> {
        if self.fail_reads {
            return Err(unavailable());
        }
        self.inner.get_address(key).await
    }

    async fn put_address(&self, record: &AddressSyncRecord) -> Result<(), StoreError> {
        if self.fail_address_writes {
            return Err(unavailable());
        }
        self.inner.put_address(record).await
    }

    async fn get_credential(&self, email: &Email) -> Result<Option<EncodedCredential>, StoreError> {
        if self.fail_reads {
            return Err(unavailable());
        }
        self.inner.get_credential(email).await
    }

    async fn put_credential(
        &self,
        email: &Email,
        credential: &EncodedCredential,
    ) -> Result<(), StoreError> {
        self.inner.put_credential(email, credential).await
    }
}
