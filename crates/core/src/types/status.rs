//! Profile platform user classifications.

use serde::{Deserialize, Serialize};

/// Target user status.
///
/// Unknown letters deserialize to [`TargetUserStatus::Other`] so a lookup
/// never fails on a status the bridge does not care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetUserStatus {
    #[default]
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "D")]
    Disabled,
    #[serde(other, skip_serializing)]
    Other,
}

/// Target user type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetUserType {
    /// Storefront customer. Every identity the bridge creates is one.
    #[default]
    #[serde(rename = "C")]
    Customer,
    #[serde(rename = "A")]
    Admin,
    #[serde(rename = "V")]
    Vendor,
    #[serde(other, skip_serializing)]
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_letters() {
        assert_eq!(serde_json::to_string(&TargetUserStatus::Active).unwrap(), "\"A\"");
        assert_eq!(serde_json::to_string(&TargetUserType::Customer).unwrap(), "\"C\"");
    }

    #[test]
    fn test_unknown_letters() {
        let status: TargetUserStatus = serde_json::from_str("\"P\"").unwrap();
        assert_eq!(status, TargetUserStatus::Other);
    }
}
