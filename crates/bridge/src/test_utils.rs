//! In-process directories and fixtures for engine tests.
//!
//! Built for this crate's unit tests and, with the `test-utils` feature, for
//! the integration test crate.

use std::collections::HashMap;
use std::sync::Mutex;

use profile_bridge_core::{
    Email, SourceAddressId, SourceRegionId, TargetProfileId, TargetUserId, TargetUserStatus,
    TargetUserType,
};

use crate::source::{
    CustomAttribute, SourceAddress, SourceDirectory, SourceError, SourceRegion,
    SourceSearchResult, SourceUser,
};
use crate::target::{
    CreatedTargetUser, LookupParams, TargetDirectory, TargetError, TargetLookup, TargetProfile,
    TargetUser, TargetUserPayload,
};

/// base64 of `s1:new`.
pub const NEW_CREDENTIAL: &str = "czE6bmV3";

/// Parse a test email.
///
/// # Panics
///
/// Panics if `raw` is not a valid email.
#[must_use]
#[allow(clippy::expect_used)]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).expect("test email")
}

/// A commerce address in Mexico City with the usual custom attributes.
#[must_use]
pub fn address(id: i32) -> SourceAddress {
    let attribute = |code: &str, value: &str| CustomAttribute {
        attribute_code: code.to_string(),
        value: value.to_string(),
    };
    SourceAddress {
        id: SourceAddressId::new(id),
        region: SourceRegion {
            region_code: Some("CDMX".to_string()),
            region: Some("Ciudad de Mexico".to_string()),
            region_id: Some(SourceRegionId::new(577)),
        },
        country_id: "MX".to_string(),
        street: vec![format!("Av. Reforma {id}")],
        telephone: "5555555555".to_string(),
        postcode: "06600".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Ruiz".to_string(),
        city: "Cuauhtemoc".to_string(),
        custom_attributes: vec![
            attribute("external_number", "221"),
            attribute("suburb", "Juarez"),
        ],
    }
}

/// A commerce customer with the given addresses and no credential.
#[must_use]
pub fn customer(raw_email: &str, address_ids: &[i32], default_shipping: Option<i32>) -> SourceUser {
    SourceUser {
        id: None,
        email: raw_email.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Ruiz".to_string(),
        group_id: None,
        default_shipping: default_shipping.map(SourceAddressId::new),
        addresses: Some(address_ids.iter().copied().map(address).collect()),
        credential: None,
    }
}

// ============================================================================
// Source
// ============================================================================

/// Commerce directory keyed by the looked-up email.
#[derive(Default)]
pub struct FakeSource {
    users: HashMap<String, Vec<SourceUser>>,
    failing: bool,
    lookups: Mutex<Vec<String>>,
}

impl FakeSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory whose every lookup fails with a 503.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Register a customer under its own email.
    #[must_use]
    pub fn with_user(self, user: SourceUser) -> Self {
        let key = user.email.clone();
        self.with_match(&key, user)
    }

    /// Answer lookups of `raw_email` with `user`, whatever its own email is.
    #[must_use]
    pub fn with_match(mut self, raw_email: &str, user: SourceUser) -> Self {
        self.users.entry(raw_email.to_string()).or_default().push(user);
        self
    }

    /// Emails looked up so far.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl SourceDirectory for FakeSource {
    #[allow(clippy::unwrap_used)]
    async fn find_users_by_email(&self, email: &Email) -> Result<SourceSearchResult, SourceError> {
        self.lookups.lock().unwrap().push(email.to_string());
        if self.failing {
            return Err(SourceError::Api {
                url: "http://source.test/customers/search".to_string(),
                status: 503,
                message: "maintenance window".to_string(),
            });
        }
        let items = self.users.get(email.as_str()).cloned().unwrap_or_default();
        Ok(SourceSearchResult {
            total_count: i64::try_from(items.len()).unwrap_or(i64::MAX),
            items,
        })
    }
}

// ============================================================================
// Target
// ============================================================================

/// A call received by [`FakeTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCall {
    Lookup(String),
    CreateUser(TargetUserPayload),
    UpdateUser(TargetUserId, TargetUserPayload),
    CreateProfiles(Vec<TargetProfile>),
    UpdateProfiles(Vec<TargetProfile>),
}

impl TargetCall {
    /// Short name of the call, for asserting on call order.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "lookup",
            Self::CreateUser(_) => "create_user",
            Self::UpdateUser(..) => "update_user",
            Self::CreateProfiles(_) => "create_profiles",
            Self::UpdateProfiles(_) => "update_profiles",
        }
    }
}

/// Profile platform with a fixed number of existing users per email.
///
/// Created users get default profile `default_profile_id`. Bulk-created
/// profiles get id `5000 + source address id`, except those listed in
/// `unassigned_profiles`, which are left out of the response. Every bulk
/// update succeeds unless the profile id is listed in `rejected_updates`.
pub struct FakeTarget {
    existing: HashMap<String, u64>,
    pub default_profile_id: i32,
    pub unassigned_profiles: Vec<SourceAddressId>,
    pub rejected_updates: Vec<TargetProfileId>,
    pub fail_create_user: bool,
    calls: Mutex<Vec<TargetCall>>,
}

impl Default for FakeTarget {
    fn default() -> Self {
        Self {
            existing: HashMap::new(),
            default_profile_id: 4410,
            unassigned_profiles: Vec::new(),
            rejected_updates: Vec::new(),
            fail_create_user: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `count` users are registered with `raw_email`.
    #[must_use]
    pub fn with_existing(mut self, raw_email: &str, count: u64) -> Self {
        self.existing.insert(raw_email.to_string(), count);
        self
    }

    /// Every call received so far.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn calls(&self) -> Vec<TargetCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of the calls received so far, in order.
    #[must_use]
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(TargetCall::name).collect()
    }

    /// Payload of the last user create or update.
    #[must_use]
    pub fn last_user_payload(&self) -> Option<TargetUserPayload> {
        self.calls().into_iter().rev().find_map(|call| match call {
            TargetCall::CreateUser(payload) | TargetCall::UpdateUser(_, payload) => Some(payload),
            _ => None,
        })
    }

    #[allow(clippy::unwrap_used)]
    fn record(&self, call: TargetCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TargetDirectory for FakeTarget {
    async fn find_users_by_email(&self, email: &Email) -> Result<TargetLookup, TargetError> {
        self.record(TargetCall::Lookup(email.to_string()));
        let count = self.existing.get(email.as_str()).copied().unwrap_or(0);
        let users = (0..count)
            .map(|n| TargetUser {
                id: TargetUserId::new((100 + n).to_string()),
                email: email.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                company_id: Some("0".to_string()),
                status: TargetUserStatus::Active,
                user_type: TargetUserType::Customer,
            })
            .collect();
        Ok(TargetLookup {
            users,
            params: LookupParams {
                total_items: Some(count),
            },
        })
    }

    async fn create_user(
        &self,
        payload: &TargetUserPayload,
    ) -> Result<CreatedTargetUser, TargetError> {
        self.record(TargetCall::CreateUser(payload.clone()));
        if self.fail_create_user {
            return Err(TargetError::Api {
                url: "http://target.test/api/users".to_string(),
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(CreatedTargetUser {
            user_id: Some(TargetUserId::new("900")),
            profile_id: Some(TargetProfileId::new(self.default_profile_id)),
        })
    }

    async fn update_user(
        &self,
        user_id: &TargetUserId,
        payload: &TargetUserPayload,
    ) -> Result<(), TargetError> {
        self.record(TargetCall::UpdateUser(user_id.clone(), payload.clone()));
        Ok(())
    }

    async fn create_profiles(
        &self,
        _email: &Email,
        profiles: &[TargetProfile],
    ) -> Result<HashMap<SourceAddressId, TargetProfileId>, TargetError> {
        self.record(TargetCall::CreateProfiles(profiles.to_vec()));
        Ok(profiles
            .iter()
            .filter(|profile| !self.unassigned_profiles.contains(&profile.profile_name))
            .map(|profile| {
                let id = TargetProfileId::new(5000 + profile.profile_name.as_i32());
                (profile.profile_name, id)
            })
            .collect())
    }

    async fn update_profiles(
        &self,
        _email: &Email,
        profiles: &[TargetProfile],
    ) -> Result<HashMap<TargetProfileId, bool>, TargetError> {
        self.record(TargetCall::UpdateProfiles(profiles.to_vec()));
        Ok(profiles
            .iter()
            .filter_map(|profile| profile.profile_id)
            .map(|id| (id, !self.rejected_updates.contains(&id)))
            .collect())
    }
}
