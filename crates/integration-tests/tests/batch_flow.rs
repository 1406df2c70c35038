//! End-to-end batch scenarios against in-process directories.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashMap;

use profile_bridge::store::{AddressKey, MemoryStore, SyncStore};
use profile_bridge::sync::{BatchCoordinator, RegionTable, RequestedUser, SyncReport, SyncRequest};
use profile_bridge_core::{
    EncodedCredential, SourceAddressId, SourceRegionId, SyncCode, SyncResult, TargetProfileId,
    TargetStateCode,
};
use profile_bridge_integration_tests::{
    FakeSource, FakeTarget, FlakyStore, TargetCall, customer, email,
};

const BUYER: &str = "buyer@shop.mx";

/// base64 of `s1:old`.
const S1_OLD: &str = "czE6b2xk";

fn regions() -> RegionTable {
    RegionTable::new(
        HashMap::from([(SourceRegionId::new(577), TargetStateCode::new(9))]),
        TargetStateCode::new(0),
    )
}

fn request(force: bool, credential: Option<&str>) -> SyncRequest {
    SyncRequest {
        force,
        users: vec![RequestedUser::new(
            email(BUYER),
            credential.and_then(EncodedCredential::new),
        )],
    }
}

async fn run<K: SyncStore>(
    source: &FakeSource,
    target: &FakeTarget,
    store: &K,
    request: &SyncRequest,
) -> SyncReport {
    let regions = regions();
    BatchCoordinator::new(source, target, store, &regions)
        .run(request)
        .await
}

fn created_user_secret(target: &FakeTarget) -> Option<String> {
    target.calls().into_iter().find_map(|call| match call {
        TargetCall::CreateUser(payload) => Some(payload.secret),
        _ => None,
    })?
}

#[tokio::test]
async fn unknown_source_user_is_reported() {
    let source = FakeSource::new();
    let target = FakeTarget::new();
    let store = MemoryStore::new();

    let report = run(&source, &target, &store, &request(false, None)).await;

    let failed = SyncResult::failure(BUYER, "no user found on source system");
    assert_eq!(report.results, vec![failed.clone()]);
    assert!(target.calls().is_empty());
    assert_eq!(store.get_result(&email(BUYER)).await.unwrap(), Some(failed));
}

#[tokio::test]
async fn new_user_is_created_with_default_profile_bound() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12, 13], Some(12)));
    let target = FakeTarget::new();
    let store = MemoryStore::new();

    let report = run(&source, &target, &store, &request(false, Some(S1_OLD))).await;

    assert_eq!(report.results, vec![SyncResult::success(BUYER, SyncCode::Created)]);

    let calls = target.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(&calls[0], TargetCall::Lookup(e) if e == BUYER));
    let TargetCall::CreateUser(payload) = &calls[1] else {
        panic!("expected user create, got {:?}", calls[1]);
    };
    assert_eq!(payload.secret.as_deref(), Some("old"));
    assert_eq!(payload.company_id.as_deref(), Some("0"));

    // The default shipping address was bound to the default profile on
    // create, so only address 13 is bulk-created.
    let TargetCall::CreateProfiles(created) = &calls[2] else {
        panic!("expected bulk create, got {:?}", calls[2]);
    };
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].profile_name, SourceAddressId::new(13));
    assert_eq!(created[0].s_state, TargetStateCode::new(9));
    assert_eq!(created[0].fields.external_number, "221");

    let TargetCall::UpdateProfiles(updated) = &calls[3] else {
        panic!("expected bulk update, got {:?}", calls[3]);
    };
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].profile_id, Some(TargetProfileId::new(4410)));

    let default = store
        .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(12)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default.target_profile_id, Some(TargetProfileId::new(4410)));
    assert!(default.success);

    let other = store
        .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(13)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other.target_profile_id, Some(TargetProfileId::new(5013)));

    assert_eq!(
        store.get_credential(&email(BUYER)).await.unwrap().unwrap().as_str(),
        S1_OLD
    );
    assert_eq!(
        store.get_result(&email(BUYER)).await.unwrap(),
        Some(SyncResult::success(BUYER, SyncCode::Created))
    );
}

#[tokio::test]
async fn loosely_matched_source_email_is_used_throughout() {
    const SOURCE_EMAIL: &str = "Buyer@Shop.mx";
    let source = FakeSource::new().with_match(BUYER, customer(SOURCE_EMAIL, &[12, 13], Some(12)));
    let target = FakeTarget::new();
    let store = MemoryStore::new();

    let first = run(&source, &target, &store, &request(false, Some(S1_OLD))).await;
    assert_eq!(
        first.results,
        vec![SyncResult::success(SOURCE_EMAIL, SyncCode::Created)]
    );

    let lookups: Vec<String> = target
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            TargetCall::Lookup(looked_up) => Some(looked_up),
            _ => None,
        })
        .collect();
    assert_eq!(lookups, vec![SOURCE_EMAIL.to_string()]);
    assert!(
        store
            .get_credential(&email(SOURCE_EMAIL))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .get_address(&AddressKey::new(email(SOURCE_EMAIL), SourceAddressId::new(13)))
            .await
            .unwrap()
            .is_some()
    );

    let second = run(&source, &target, &store, &request(false, Some(S1_OLD))).await;
    assert_eq!(second.results, first.results);
    assert_eq!(source.lookups(), vec![BUYER.to_string()]);
}

#[tokio::test]
async fn duplicate_target_users_fail_the_user() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], None));
    let target = FakeTarget::new().with_existing(BUYER, 2);
    let store = MemoryStore::new();

    let report = run(&source, &target, &store, &request(true, None)).await;

    let result = &report.results[0];
    assert_eq!(result.code, SyncCode::Failed);
    assert!(result.reason.as_deref().unwrap().contains("more than one user found"));
    assert_eq!(target.calls().len(), 1);
}

#[tokio::test]
async fn existing_target_user_needs_force() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], None));
    let target = FakeTarget::new().with_existing(BUYER, 1);
    let store = MemoryStore::new();

    let report = run(&source, &target, &store, &request(false, None)).await;

    assert_eq!(
        report.results,
        vec![SyncResult::failure(BUYER, "user already exists, force required")]
    );
}

#[tokio::test]
async fn migrated_user_is_served_from_history_unless_forced() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], None));
    let target = FakeTarget::new().with_existing(BUYER, 1);
    let store = MemoryStore::new();
    let updated = SyncResult::success(BUYER, SyncCode::Updated);
    store.put_result(&email(BUYER), &updated).await.unwrap();

    let report = run(&source, &target, &store, &request(false, None)).await;
    assert_eq!(report.results, vec![updated]);
    assert!(source.lookups().is_empty());
    assert!(target.calls().is_empty());

    let report = run(&source, &target, &store, &request(true, None)).await;
    assert_eq!(report.results, vec![SyncResult::success(BUYER, SyncCode::Updated)]);
    assert_eq!(source.lookups(), vec![BUYER.to_string()]);
    assert!(
        target
            .calls()
            .iter()
            .any(|call| matches!(call, TargetCall::UpdateUser(..)))
    );
}

#[tokio::test]
async fn forced_resync_updates_known_profiles() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12, 13], Some(12)));
    let store = MemoryStore::new();

    let first = FakeTarget::new();
    run(&source, &first, &store, &request(false, None)).await;

    let second = FakeTarget::new().with_existing(BUYER, 1);
    let report = run(&source, &second, &store, &request(true, None)).await;
    assert_eq!(report.results[0].code, SyncCode::Updated);

    let calls = second.calls();
    let TargetCall::UpdateUser(_, payload) = &calls[1] else {
        panic!("expected user update, got {:?}", calls[1]);
    };
    assert_eq!(payload.secret, None);
    assert!(
        !calls
            .iter()
            .any(|call| matches!(call, TargetCall::CreateProfiles(_)))
    );
    let TargetCall::UpdateProfiles(updated) = &calls[2] else {
        panic!("expected bulk update, got {:?}", calls[2]);
    };
    let ids: Vec<Option<TargetProfileId>> = updated.iter().map(|p| p.profile_id).collect();
    assert_eq!(
        ids,
        vec![Some(TargetProfileId::new(4410)), Some(TargetProfileId::new(5013))]
    );
}

#[tokio::test]
async fn rejected_update_is_recreated_next_time() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], Some(12)));
    let store = MemoryStore::new();

    let mut target = FakeTarget::new();
    target.rejected_updates = vec![TargetProfileId::new(4410)];
    run(&source, &target, &store, &request(false, None)).await;

    let record = store
        .get_address(&AddressKey::new(email(BUYER), SourceAddressId::new(12)))
        .await
        .unwrap()
        .unwrap();
    assert!(!record.success);

    let retry = FakeTarget::new().with_existing(BUYER, 1);
    run(&source, &retry, &store, &request(true, None)).await;
    assert!(
        retry
            .calls()
            .iter()
            .any(|call| matches!(call, TargetCall::CreateProfiles(p) if p.len() == 1))
    );
}

#[tokio::test]
async fn unchanged_credential_is_not_resent() {
    let source = FakeSource::new().with_user(customer(BUYER, &[], None));
    let target = FakeTarget::new();
    let store = MemoryStore::new();
    let stored = EncodedCredential::new(S1_OLD).unwrap();
    store.put_credential(&email(BUYER), &stored).await.unwrap();

    run(&source, &target, &store, &request(false, Some(S1_OLD))).await;

    assert_eq!(created_user_secret(&target), None);
    assert_eq!(
        store.get_credential(&email(BUYER)).await.unwrap(),
        Some(stored)
    );
}

#[tokio::test]
async fn undecodable_credential_is_sent_raw_and_kept() {
    let source = FakeSource::new().with_user(customer(BUYER, &[], None));
    let target = FakeTarget::new();
    let store = MemoryStore::new();

    run(&source, &target, &store, &request(false, Some("anything"))).await;

    assert_eq!(created_user_secret(&target).as_deref(), Some("anything"));
    assert_eq!(
        store.get_credential(&email(BUYER)).await.unwrap().unwrap().as_str(),
        "anything"
    );
}

#[tokio::test]
async fn failed_update_record_aborts_the_user() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], Some(12)));
    let target = FakeTarget::new();
    let mut store = FlakyStore::new();
    run(&source, &target, &store, &request(false, None)).await;

    store.fail_address_writes = true;
    let retry = FakeTarget::new().with_existing(BUYER, 1);
    let report = run(&source, &retry, &store, &request(true, None)).await;

    let result = &report.results[0];
    assert_eq!(result.code, SyncCode::Failed);
    assert_eq!(
        result.reason.as_deref(),
        Some("store unavailable: injected failure")
    );
}

#[tokio::test]
async fn store_outage_does_not_block_creation() {
    let source = FakeSource::new().with_user(customer(BUYER, &[12], Some(12)));
    let target = FakeTarget::new();
    let store = FlakyStore {
        fail_reads: true,
        fail_address_writes: true,
        fail_result_writes: true,
        ..FlakyStore::default()
    };

    let report = run(&source, &target, &store, &request(false, None)).await;

    // Reads count as empty and create-path writes only log, so the user is
    // created and its address is bulk-created as if new.
    assert_eq!(report.results, vec![SyncResult::success(BUYER, SyncCode::Created)]);
    assert!(
        target
            .calls()
            .iter()
            .any(|call| matches!(call, TargetCall::CreateProfiles(p) if p.len() == 1))
    );
}

#[tokio::test]
async fn source_outage_is_a_per_user_failure() {
    let source = FakeSource::unavailable();
    let target = FakeTarget::new();
    let store = MemoryStore::new();

    let mut request = request(false, None);
    request.users.push(RequestedUser::new(email("other@shop.mx"), None));
    let report = run(&source, &target, &store, &request).await;

    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| r.code == SyncCode::Failed));
    assert!(report.results[0].reason.as_deref().unwrap().contains("503"));
    assert_eq!(report.results[1].email, "other@shop.mx");
}
