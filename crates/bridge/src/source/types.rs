//! Commerce platform (Magento REST) types.
//!
//! Only the fields the bridge maps are modelled; everything else in the
//! customer payload is ignored.

use serde::Deserialize;

use profile_bridge_core::{
    EncodedCredential, SourceAddressId, SourceGroupId, SourceRegionId, SourceUserId,
};

/// Result of `GET customers/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSearchResult {
    #[serde(default)]
    pub items: Vec<SourceUser>,
    #[serde(default)]
    pub total_count: i64,
}

/// A commerce customer.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceUser {
    #[serde(default)]
    pub id: Option<SourceUserId>,
    pub email: String,
    #[serde(default, rename = "firstname")]
    pub first_name: String,
    #[serde(default, rename = "lastname")]
    pub last_name: String,
    #[serde(default)]
    pub group_id: Option<SourceGroupId>,
    /// Default shipping address id (sent as a string by the platform).
    #[serde(default, deserialize_with = "crate::wire::optional_id")]
    pub default_shipping: Option<SourceAddressId>,
    /// `None` when the payload has no `addresses` key at all.
    #[serde(default)]
    pub addresses: Option<Vec<SourceAddress>>,
    /// Never part of the search payload; injected from the sync request.
    #[serde(skip)]
    pub credential: Option<EncodedCredential>,
}

impl SourceUser {
    /// Default shipping id, if one is set and nonzero.
    #[must_use]
    pub fn default_shipping_id(&self) -> Option<SourceAddressId> {
        self.default_shipping.filter(SourceAddressId::is_set)
    }
}

/// A customer address.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceAddress {
    pub id: SourceAddressId,
    #[serde(default)]
    pub region: SourceRegion,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub street: Vec<String>,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default, rename = "firstname")]
    pub first_name: String,
    #[serde(default, rename = "lastname")]
    pub last_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
}

impl SourceAddress {
    /// First street line, or empty.
    #[must_use]
    pub fn street_line(&self) -> &str {
        self.street.first().map_or("", String::as_str)
    }

    /// Value of a custom attribute, if present and non-empty.
    ///
    /// When a code repeats, the last occurrence wins.
    #[must_use]
    pub fn attribute(&self, code: &str) -> Option<&str> {
        self.custom_attributes
            .iter()
            .rev()
            .find(|attribute| attribute.attribute_code == code)
            .map(|attribute| attribute.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

/// Address region.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRegion {
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<SourceRegionId>,
}

/// A `custom_attributes` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomAttribute {
    pub attribute_code: String,
    #[serde(default)]
    pub value: String,
}
