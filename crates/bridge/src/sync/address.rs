//! Address reconciliation.
//!
//! Maps commerce addresses to Target profiles and splits them into profiles
//! to create and profiles to update, based on earlier sync records.

use std::collections::HashMap;

use tracing::warn;

use profile_bridge_core::Email;

use super::RegionTable;
use crate::source::SourceAddress;
use crate::store::{AddressKey, AddressSyncRecord, SyncStore};
use crate::target::{ProfileFields, TargetProfile};

const ATTR_EXTERNAL_NUMBER: &str = "external_number";
const ATTR_INTERNAL_NUMBER: &str = "internal_number";
const ATTR_SUBURB: &str = "suburb";
const ATTR_RECEPTOR_DETAILS: &str = "receptor_details";
const ATTR_TOWNSHIP: &str = "township";

/// Address records loaded ahead of reconciliation.
#[derive(Debug, Clone, Default)]
pub struct AddressSyncIndex {
    records: HashMap<AddressKey, AddressSyncRecord>,
}

impl AddressSyncIndex {
    /// Load the records for every address of `email`.
    ///
    /// A failed lookup is logged and the address treated as never synced.
    pub async fn load<S: SyncStore>(store: &S, email: &Email, addresses: &[SourceAddress]) -> Self {
        let mut records = HashMap::with_capacity(addresses.len());
        for address in addresses {
            let key = AddressKey::new(email.clone(), address.id);
            match store.get_address(&key).await {
                Ok(Some(record)) => {
                    records.insert(key, record);
                }
                Ok(None) => {}
                Err(e) => warn!(
                    error = %e,
                    email = %email,
                    address_id = %address.id,
                    "Address record lookup failed, treating as new"
                ),
            }
        }
        Self { records }
    }

    #[must_use]
    pub fn get(&self, key: &AddressKey) -> Option<&AddressSyncRecord> {
        self.records.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<AddressSyncRecord> for AddressSyncIndex {
    fn from_iter<I: IntoIterator<Item = AddressSyncRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.key.clone(), record))
                .collect(),
        }
    }
}

/// Profiles split by the bulk call that should carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPlan {
    pub to_create: Vec<TargetProfile>,
    pub to_update: Vec<TargetProfile>,
}

impl AddressPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }
}

/// Build the Target profile for one commerce address.
///
/// Shipping and billing blocks carry the same values. The second address
/// line is the township, or the city when no township is given.
#[must_use]
pub fn map_address(address: &SourceAddress, regions: &RegionTable) -> TargetProfile {
    let attribute = |code: &str| address.attribute(code).unwrap_or_default().to_owned();

    let street = address.street_line().to_owned();
    let address_2 = address
        .attribute(ATTR_TOWNSHIP)
        .unwrap_or(address.city.as_str())
        .to_owned();
    let state = regions.state_for(address.region.region_id);

    let external_number = attribute(ATTR_EXTERNAL_NUMBER);
    let internal_number = attribute(ATTR_INTERNAL_NUMBER);
    let reference = attribute(ATTR_RECEPTOR_DETAILS);
    let suburb = attribute(ATTR_SUBURB);

    TargetProfile {
        profile_id: None,
        profile_name: address.id,
        s_firstname: address.first_name.clone(),
        s_lastname: address.last_name.clone(),
        s_address: street.clone(),
        s_address_2: address_2.clone(),
        s_city: address.city.clone(),
        s_country: address.country_id.clone(),
        s_state: state,
        s_zipcode: address.postcode.clone(),
        s_phone: address.telephone.clone(),
        b_firstname: address.first_name.clone(),
        b_lastname: address.last_name.clone(),
        b_address: street,
        b_address_2: address_2,
        b_city: address.city.clone(),
        b_country: address.country_id.clone(),
        b_state: state,
        b_zipcode: address.postcode.clone(),
        b_phone: address.telephone.clone(),
        fields: ProfileFields {
            billing_external_number: external_number.clone(),
            billing_internal_number: internal_number.clone(),
            billing_reference: reference.clone(),
            billing_suburb: suburb.clone(),
            external_number,
            internal_number,
            reference,
            suburb,
        },
    }
}

/// Split `addresses` into profiles to create and profiles to update.
///
/// An address goes to `to_update` only when its record is successful and
/// carries a profile id. Input order is kept in both lists.
#[must_use]
pub fn partition_addresses(
    addresses: &[SourceAddress],
    email: &Email,
    index: &AddressSyncIndex,
    regions: &RegionTable,
) -> AddressPlan {
    let mut plan = AddressPlan::default();

    for address in addresses {
        let mut profile = map_address(address, regions);
        let key = AddressKey::new(email.clone(), address.id);

        let synced_profile = index
            .get(&key)
            .filter(|record| record.success)
            .and_then(|record| record.target_profile_id);

        match synced_profile {
            Some(profile_id) => {
                profile.profile_id = Some(profile_id);
                plan.to_update.push(profile);
            }
            None => plan.to_create.push(profile),
        }
    }

    plan
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use profile_bridge_core::{SourceAddressId, SourceRegionId, TargetProfileId, TargetStateCode};

    use super::*;
    use crate::source::{CustomAttribute, SourceRegion};
    use crate::store::MemoryStore;

    fn email() -> Email {
        Email::parse("buyer@shop.mx").unwrap()
    }

    fn regions() -> RegionTable {
        RegionTable::new(
            HashMap::from([(SourceRegionId::new(577), TargetStateCode::new(9))]),
            TargetStateCode::new(0),
        )
    }

    fn address(id: i32, attributes: &[(&str, &str)]) -> SourceAddress {
        SourceAddress {
            id: SourceAddressId::new(id),
            region: SourceRegion {
                region_code: Some("CDMX".to_string()),
                region: Some("Ciudad de Mexico".to_string()),
                region_id: Some(SourceRegionId::new(577)),
            },
            country_id: "MX".to_string(),
            street: vec!["Av. Reforma".to_string(), "Piso 3".to_string()],
            telephone: "5555555555".to_string(),
            postcode: "06600".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            city: "Cuauhtemoc".to_string(),
            custom_attributes: attributes
                .iter()
                .map(|(code, value)| CustomAttribute {
                    attribute_code: (*code).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
        }
    }

    fn record(id: i32, profile_id: Option<i32>, success: bool) -> AddressSyncRecord {
        AddressSyncRecord {
            key: AddressKey::new(email(), SourceAddressId::new(id)),
            target_profile_id: profile_id.map(TargetProfileId::new),
            success,
        }
    }

    #[test]
    fn test_map_address_duplicates_shipping_into_billing() {
        let profile = map_address(
            &address(
                12,
                &[
                    ("external_number", "221"),
                    ("internal_number", "B"),
                    ("suburb", "Juarez"),
                    ("receptor_details", "Leave at desk"),
                    ("township", "Centro"),
                ],
            ),
            &regions(),
        );

        assert_eq!(profile.profile_name, SourceAddressId::new(12));
        assert_eq!(profile.s_address, "Av. Reforma");
        assert_eq!(profile.s_address_2, "Centro");
        assert_eq!(profile.s_state, TargetStateCode::new(9));
        assert_eq!(profile.s_address_2, profile.b_address_2);
        assert_eq!(profile.s_state, profile.b_state);
        assert_eq!(profile.s_phone, profile.b_phone);
        assert_eq!(profile.fields.external_number, "221");
        assert_eq!(profile.fields.billing_external_number, "221");
        assert_eq!(profile.fields.reference, "Leave at desk");
        assert_eq!(profile.fields.billing_suburb, "Juarez");
    }

    #[test]
    fn test_map_address_defaults_township_to_city() {
        let profile = map_address(&address(12, &[("township", "")]), &regions());
        assert_eq!(profile.s_address_2, "Cuauhtemoc");
        assert_eq!(profile.b_address_2, "Cuauhtemoc");
        assert_eq!(profile.fields.internal_number, "");
    }

    #[test]
    fn test_map_address_without_street_or_region() {
        let mut source = address(12, &[]);
        source.street.clear();
        source.region = SourceRegion::default();
        let profile = map_address(&source, &regions());
        assert_eq!(profile.s_address, "");
        assert_eq!(profile.s_state, TargetStateCode::new(0));
    }

    #[test]
    fn test_partition_by_prior_record() {
        let addresses = vec![address(1, &[]), address(2, &[]), address(3, &[]), address(4, &[])];
        let index: AddressSyncIndex = vec![
            record(2, Some(4410), true),
            record(3, Some(4411), false),
            record(4, None, true),
        ]
        .into_iter()
        .collect();

        let plan = partition_addresses(&addresses, &email(), &index, &regions());

        let created: Vec<i32> = plan.to_create.iter().map(|p| p.profile_name.as_i32()).collect();
        assert_eq!(created, vec![1, 3, 4]);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].profile_name, SourceAddressId::new(2));
        assert_eq!(plan.to_update[0].profile_id, Some(TargetProfileId::new(4410)));
        assert!(plan.to_create.iter().all(|p| p.profile_id.is_none()));
    }

    #[test]
    fn test_partition_is_total() {
        let addresses: Vec<SourceAddress> = (1..=7).map(|id| address(id, &[])).collect();
        let index: AddressSyncIndex = [1, 3, 5]
            .into_iter()
            .map(|id| record(id, Some(id * 100), true))
            .collect();

        let plan = partition_addresses(&addresses, &email(), &index, &regions());

        assert_eq!(plan.len(), addresses.len());
        let mut seen: Vec<i32> = plan
            .to_create
            .iter()
            .chain(&plan.to_update)
            .map(|p| p.profile_name.as_i32())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_index_ignores_records_of_other_emails() {
        let other = Email::parse("other@shop.mx").unwrap();
        let index: AddressSyncIndex = vec![AddressSyncRecord {
            key: AddressKey::new(other, SourceAddressId::new(1)),
            target_profile_id: Some(TargetProfileId::new(9)),
            success: true,
        }]
        .into_iter()
        .collect();

        let plan = partition_addresses(&[address(1, &[])], &email(), &index, &regions());
        assert_eq!(plan.to_create.len(), 1);
    }

    #[tokio::test]
    async fn test_load_reads_only_known_addresses() {
        let store = MemoryStore::new();
        store.put_address(&record(1, Some(10), true)).await.unwrap();
        store.put_address(&record(9, Some(90), true)).await.unwrap();

        let index =
            AddressSyncIndex::load(&store, &email(), &[address(1, &[]), address(2, &[])]).await;
        assert_eq!(index.len(), 1);
        assert!(index.get(&AddressKey::new(email(), SourceAddressId::new(1))).is_some());
    }
}
