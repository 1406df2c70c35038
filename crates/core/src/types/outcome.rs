//! Per-user sync outcomes.

use serde::{Deserialize, Serialize};

/// Result code of one user sync.
///
/// Serialized as its integer code. Any integer other than 1, 2 or 3 is
/// rejected when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SyncCode {
    /// User created on the profile platform.
    Created,
    /// Existing user updated (forced).
    Updated,
    /// Sync failed; the result carries a reason.
    Failed,
}

impl SyncCode {
    /// All codes in legend order.
    pub const ALL: [Self; 3] = [Self::Created, Self::Updated, Self::Failed];

    /// Integer code on the wire.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Created => 1,
            Self::Updated => 2,
            Self::Failed => 3,
        }
    }

    /// Human label used in the response legend.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Failed => "error",
        }
    }

    /// Whether the user already reached the profile platform.
    #[must_use]
    pub const fn is_migrated(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Error for integers that are not a [`SyncCode`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid sync code: {0}")]
pub struct InvalidSyncCode(pub u8);

impl TryFrom<u8> for SyncCode {
    type Error = InvalidSyncCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Created),
            2 => Ok(Self::Updated),
            3 => Ok(Self::Failed),
            other => Err(InvalidSyncCode(other)),
        }
    }
}

impl From<SyncCode> for u8 {
    fn from(code: SyncCode) -> Self {
        code.as_u8()
    }
}

/// Outcome of syncing one user, as reported and as kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub email: String,
    pub code: SyncCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SyncResult {
    /// A successful result.
    #[must_use]
    pub fn success(email: impl Into<String>, code: SyncCode) -> Self {
        Self {
            email: email.into(),
            code,
            reason: None,
        }
    }

    /// A failed result with its reason.
    #[must_use]
    pub fn failure(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            code: SyncCode::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// One legend entry mapping a code to its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLabel {
    pub code: SyncCode,
    pub label: String,
}

impl ResultLabel {
    /// The fixed legend returned with every report.
    #[must_use]
    pub fn legend() -> Vec<Self> {
        SyncCode::ALL
            .into_iter()
            .map(|code| Self {
                code,
                label: code.label().to_owned(),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_as_integers() {
        let result = SyncResult::failure("a@x.com", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@x.com", "code": 3, "reason": "boom"})
        );
    }

    #[test]
    fn test_success_omits_reason() {
        let json = serde_json::to_string(&SyncResult::success("a@x.com", SyncCode::Created)).unwrap();
        assert_eq!(json, r#"{"email":"a@x.com","code":1}"#);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = serde_json::from_str::<SyncResult>(r#"{"email":"a@x.com","code":4}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_legend() {
        let legend = ResultLabel::legend();
        let pairs: Vec<(u8, &str)> = legend
            .iter()
            .map(|entry| (entry.code.as_u8(), entry.label.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "created"), (2, "updated"), (3, "error")]);
    }
}
