//! Profile platform (GAMA) API types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use profile_bridge_core::{
    SourceAddressId, TargetProfileId, TargetStateCode, TargetUserId, TargetUserStatus,
    TargetUserType,
};

/// Result of `GET api/users?email=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetLookup {
    #[serde(default)]
    pub users: Vec<TargetUser>,
    #[serde(default)]
    pub params: LookupParams,
}

impl TargetLookup {
    /// Number of users matching the email.
    ///
    /// Uses the platform's own total when it is present and numeric, the
    /// length of `users` otherwise.
    #[must_use]
    pub fn match_count(&self) -> u64 {
        self.params
            .total_items
            .unwrap_or_else(|| u64::try_from(self.users.len()).unwrap_or(u64::MAX))
    }
}

/// Lookup pagination parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    /// Sent as a string.
    #[serde(default, deserialize_with = "crate::wire::lenient_count")]
    pub total_items: Option<u64>,
}

/// A profile platform user.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetUser {
    #[serde(rename = "user_id", deserialize_with = "crate::wire::text_id")]
    pub id: TargetUserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "firstname")]
    pub first_name: String,
    #[serde(default, rename = "lastname")]
    pub last_name: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub status: TargetUserStatus,
    #[serde(default)]
    pub user_type: TargetUserType,
}

/// Body of a user create or update.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TargetUserPayload {
    pub email: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub status: TargetUserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<TargetUserType>,
    /// Secret segment of the credential. Omitted means "unchanged".
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl std::fmt::Debug for TargetUserPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetUserPayload")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("status", &self.status)
            .field("company_id", &self.company_id)
            .field("user_type", &self.user_type)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Response of `POST api/users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedTargetUser {
    #[serde(default, deserialize_with = "crate::wire::optional_text_id")]
    pub user_id: Option<TargetUserId>,
    /// Profile created alongside the user (sent as a string).
    #[serde(default, deserialize_with = "crate::wire::optional_id")]
    pub profile_id: Option<TargetProfileId>,
}

/// A Target address profile.
///
/// Shipping (`s_*`) and billing (`b_*`) fields always carry the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<TargetProfileId>,
    /// Source address id; the correlation key of bulk requests.
    pub profile_name: SourceAddressId,
    pub s_firstname: String,
    pub s_lastname: String,
    pub s_address: String,
    pub s_address_2: String,
    pub s_city: String,
    pub s_country: String,
    pub s_state: TargetStateCode,
    pub s_zipcode: String,
    pub s_phone: String,
    pub b_firstname: String,
    pub b_lastname: String,
    pub b_address: String,
    pub b_address_2: String,
    pub b_city: String,
    pub b_country: String,
    pub b_state: TargetStateCode,
    pub b_zipcode: String,
    pub b_phone: String,
    pub fields: ProfileFields,
}

/// Extension fields keyed by the platform's numeric field ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileFields {
    #[serde(rename = "59")]
    pub external_number: String,
    #[serde(rename = "61")]
    pub internal_number: String,
    #[serde(rename = "63")]
    pub reference: String,
    #[serde(rename = "65")]
    pub suburb: String,
    #[serde(rename = "58")]
    pub billing_external_number: String,
    #[serde(rename = "60")]
    pub billing_internal_number: String,
    #[serde(rename = "62")]
    pub billing_reference: String,
    #[serde(rename = "64")]
    pub billing_suburb: String,
}

/// Body of the bulk profile calls.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileBatchRequest<'a> {
    pub email: &'a str,
    pub profiles: &'a [TargetProfile],
}

/// Response of a bulk create: Source address id to assigned profile id (0 = failed).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreateProfilesResponse {
    #[serde(default, deserialize_with = "crate::wire::map_or_empty_list")]
    pub profiles: HashMap<SourceAddressId, TargetProfileId>,
}

/// Response of a bulk update: profile id to success flag.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpdateProfilesResponse {
    #[serde(default, deserialize_with = "crate::wire::map_or_empty_list")]
    pub profiles: HashMap<TargetProfileId, bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_match_count_prefers_platform_total() {
        let lookup: TargetLookup = serde_json::from_str(
            r#"{"users": [{"user_id": "5", "email": "a@x.com"}], "params": {"total_items": "2"}}"#,
        )
        .unwrap();
        assert_eq!(lookup.match_count(), 2);

        let lookup: TargetLookup =
            serde_json::from_str(r#"{"users": [{"user_id": 5}], "params": {}}"#).unwrap();
        assert_eq!(lookup.match_count(), 1);
        assert_eq!(lookup.users.first().unwrap().id.as_str(), "5");
    }

    #[test]
    fn test_payload_omits_unchanged_secret() {
        let payload = TargetUserPayload {
            email: "a@x.com".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            status: TargetUserStatus::Active,
            company_id: None,
            user_type: None,
            secret: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@x.com", "firstname": "Ana", "lastname": "Ruiz", "status": "A"})
        );
    }

    #[test]
    fn test_payload_debug_redacts_secret() {
        let payload = TargetUserPayload {
            email: "a@x.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            status: TargetUserStatus::Active,
            company_id: Some("0".to_string()),
            user_type: Some(TargetUserType::Customer),
            secret: Some("hunter2".to_string()),
        };
        let debug = format!("{payload:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_created_user_profile_id_as_string() {
        let created: CreatedTargetUser =
            serde_json::from_str(r#"{"user_id": 88, "profile_id": "4410"}"#).unwrap();
        assert_eq!(created.profile_id, Some(TargetProfileId::new(4410)));
        assert_eq!(created.user_id.unwrap().as_str(), "88");
    }

    #[test]
    fn test_fields_use_numeric_keys() {
        let fields = ProfileFields {
            external_number: "12".to_string(),
            billing_external_number: "12".to_string(),
            ..ProfileFields::default()
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["59"], "12");
        assert_eq!(json["58"], "12");
        assert_eq!(json["65"], "");
    }
}
