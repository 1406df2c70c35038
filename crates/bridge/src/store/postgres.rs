//! `PostgreSQL` store.
//!
//! Tables are created by the migrations in `crates/bridge/migrations/`:
//!
//! - `migrated_users` - last reported result per email
//! - `migrated_addresses` - address records keyed by `(email, source_address_id)`
//! - `migrated_credentials` - last pushed credential per email
//!
//! Queries are checked at runtime so the crate builds without a live database.

use sqlx::PgPool;
use tracing::instrument;

use profile_bridge_core::{Email, EncodedCredential, SyncCode, SyncResult, TargetProfileId};

use super::{AddressKey, AddressSyncRecord, StoreError, SyncStore};

/// [`SyncStore`] backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Convert a stored `SMALLINT` into a [`SyncCode`].
fn decode_code(raw: i16) -> Result<SyncCode, StoreError> {
    u8::try_from(raw)
        .ok()
        .and_then(|code| SyncCode::try_from(code).ok())
        .ok_or_else(|| StoreError::DataCorruption(format!("invalid sync code in database: {raw}")))
}

impl SyncStore for PgSyncStore {
    #[instrument(skip_all, fields(email = %email))]
    async fn get_result(&self, email: &Email) -> Result<Option<SyncResult>, StoreError> {
        let row: Option<(String, i16, Option<String>)> = sqlx::query_as(
            "SELECT result_email, code, reason FROM migrated_users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(result_email, code, reason)| {
            decode_code(code).map(|code| SyncResult {
                email: result_email,
                code,
                reason,
            })
        })
        .transpose()
    }

    #[instrument(skip_all, fields(email = %email, code = result.code.as_u8()))]
    async fn put_result(&self, email: &Email, result: &SyncResult) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO migrated_users (email, result_email, code, reason)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET result_email = EXCLUDED.result_email,
                code = EXCLUDED.code,
                reason = EXCLUDED.reason,
                updated_at = now()
            ",
        )
        .bind(email.as_str())
        .bind(&result.email)
        .bind(i16::from(result.code.as_u8()))
        .bind(result.reason.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(email = %key.email, address_id = %key.address_id))]
    async fn get_address(&self, key: &AddressKey) -> Result<Option<AddressSyncRecord>, StoreError> {
        let row: Option<(Option<i32>, bool)> = sqlx::query_as(
            r"
            SELECT target_profile_id, success
            FROM migrated_addresses
            WHERE email = $1 AND source_address_id = $2
            ",
        )
        .bind(key.email.as_str())
        .bind(key.address_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(profile_id, success)| AddressSyncRecord {
            key: key.clone(),
            target_profile_id: profile_id.map(TargetProfileId::new),
            success,
        }))
    }

    #[instrument(skip_all, fields(email = %record.key.email, address_id = %record.key.address_id))]
    async fn put_address(&self, record: &AddressSyncRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO migrated_addresses (email, source_address_id, target_profile_id, success)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email, source_address_id) DO UPDATE
            SET target_profile_id = EXCLUDED.target_profile_id,
                success = EXCLUDED.success,
                updated_at = now()
            ",
        )
        .bind(record.key.email.as_str())
        .bind(record.key.address_id.as_i32())
        .bind(record.target_profile_id.map(|id| id.as_i32()))
        .bind(record.success)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn get_credential(&self, email: &Email) -> Result<Option<EncodedCredential>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT credential FROM migrated_credentials WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;

        // A blank column reads as no record.
        Ok(row.and_then(|(credential,)| EncodedCredential::new(credential)))
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn put_credential(
        &self,
        email: &Email,
        credential: &EncodedCredential,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO migrated_credentials (email, credential)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE
            SET credential = EXCLUDED.credential, updated_at = now()
            ",
        )
        .bind(email.as_str())
        .bind(credential.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
