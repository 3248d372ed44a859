//! End-to-end feature resolution and override scenarios.

use tenantry_core::{EditionId, EffectiveFeatureValue, TenantId};
use tenantry_events::LifecycleEvent;
use tenantry_features::{FeatureLayer, WriteOutcome};
use tenantry_storage::{FeatureCache, TenantFeatureSnapshot, TenantRepository};
use tenantry_test_utils::assertions::{assert_storage_error, assert_tenant_not_found};
use tenantry_test_utils::fixtures::{
    chat_catalog, chat_edition, standard_catalog, tenant_fixture, FeatureHarness,
};
use tenantry_test_utils::init_tracing;

#[tokio::test]
async fn chat_override_round_trip_without_edition() {
    init_tracing();
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;
    let tenant = features.tenants().create(tenant_fixture(7)).await.unwrap();

    features.set_value(&tenant, "Chat", "true").await.unwrap();
    assert_eq!(
        features.effective_value(TenantId::new(7), "Chat").await.unwrap(),
        Some("true".to_string())
    );

    features.set_value(&tenant, "Chat", "false").await.unwrap();
    assert_eq!(
        features.effective_value(TenantId::new(7), "Chat").await.unwrap(),
        Some("false".to_string())
    );
    assert!(features.overrides(TenantId::new(7)).await.unwrap().is_empty());
}

#[tokio::test]
async fn edition_value_applies_without_override() {
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;
    features
        .tenants()
        .create(tenant_fixture(9).with_edition(EditionId::new(3)))
        .await
        .unwrap();

    let resolved = features
        .resolve(TenantId::new(9), "Chat")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.value, "true");
    assert_eq!(resolved.source, FeatureLayer::Edition);
}

#[tokio::test]
async fn repeated_set_value_leaves_same_state() {
    let harness = FeatureHarness::start(standard_catalog(), chat_edition());
    let features = &harness.features;
    let tenant = features.tenants().create(tenant_fixture(7)).await.unwrap();

    assert_eq!(
        features.set_value(&tenant, "MaxUsers", "25").await.unwrap(),
        WriteOutcome::Inserted
    );
    let once = features.overrides(TenantId::new(7)).await.unwrap();

    assert_eq!(
        features.set_value(&tenant, "MaxUsers", "25").await.unwrap(),
        WriteOutcome::Unchanged
    );
    let twice = features.overrides(TenantId::new(7)).await.unwrap();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn setting_the_default_removes_prior_override() {
    let harness = FeatureHarness::start(standard_catalog(), chat_edition());
    let features = &harness.features;
    let tenant = features
        .tenants()
        .create(tenant_fixture(9).with_edition(EditionId::new(3)))
        .await
        .unwrap();

    features.set_value(&tenant, "Chat", "false").await.unwrap();
    assert_eq!(features.overrides(TenantId::new(9)).await.unwrap().len(), 1);

    assert_eq!(
        features.set_value(&tenant, "Chat", "true").await.unwrap(),
        WriteOutcome::Removed
    );
    assert!(features.overrides(TenantId::new(9)).await.unwrap().is_empty());
    assert_eq!(
        features.effective_value(TenantId::new(9), "Chat").await.unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn edition_default_changes_reach_tenants_without_override() {
    let harness = FeatureHarness::start(standard_catalog(), chat_edition());
    let features = &harness.features;
    features
        .tenants()
        .create(tenant_fixture(9).with_edition(EditionId::new(3)))
        .await
        .unwrap();

    harness
        .editions
        .set(EditionId::new(3), "MaxUsers", "100")
        .await;

    assert_eq!(
        features.effective_value(TenantId::new(9), "MaxUsers").await.unwrap(),
        Some("100".to_string())
    );
}

#[tokio::test]
async fn reset_all_falls_back_to_defaults() {
    let harness = FeatureHarness::start(standard_catalog(), chat_edition());
    let features = &harness.features;
    features
        .tenants()
        .create(tenant_fixture(9).with_edition(EditionId::new(3)))
        .await
        .unwrap();

    features
        .set_values(
            TenantId::new(9),
            &[("Chat", "false"), ("MaxUsers", "50"), ("Audit", "false")],
        )
        .await
        .unwrap();
    assert_eq!(features.overrides(TenantId::new(9)).await.unwrap().len(), 3);

    assert_eq!(features.reset_all(TenantId::new(9)).await.unwrap(), 3);
    assert_eq!(
        features.effective_values(TenantId::new(9)).await.unwrap(),
        vec![
            EffectiveFeatureValue::new("Chat", "true"),
            EffectiveFeatureValue::new("MaxUsers", "10"),
            EffectiveFeatureValue::new("Audit", "true"),
        ]
    );
}

#[tokio::test]
async fn unknown_feature_never_stores_a_row() {
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;
    let tenant = features.tenants().create(tenant_fixture(7)).await.unwrap();

    assert_eq!(
        features.set_value(&tenant, "nonexistent", "anything").await.unwrap(),
        WriteOutcome::Unchanged
    );
    assert_eq!(harness.store.setting_count(), 0);
    assert_eq!(
        features.effective_value(TenantId::new(7), "nonexistent").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn failed_assignment_rolls_back_whole_batch() {
    let harness = FeatureHarness::start(standard_catalog(), chat_edition());
    let features = &harness.features;
    features.tenants().create(tenant_fixture(7)).await.unwrap();
    harness.store.reject_feature("Audit").unwrap();

    let result = features
        .set_values(
            TenantId::new(7),
            &[("Chat", "true"), ("Audit", "false"), ("MaxUsers", "5")],
        )
        .await;

    assert_storage_error(&result);
    assert!(features.overrides(TenantId::new(7)).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_for_missing_tenant() {
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;

    let empty = features.set_values(TenantId::new(404), &[]).await.unwrap();
    assert!(empty.is_empty());

    let result = features
        .set_values(TenantId::new(404), &[("Chat", "true")])
        .await;
    assert_tenant_not_found(&result, TenantId::new(404));

    let result = features
        .set_value_by_id(TenantId::new(404), "Chat", "true")
        .await;
    assert_tenant_not_found(&result, TenantId::new(404));
}

#[tokio::test]
async fn override_write_evicts_cached_snapshot() {
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;
    // Stored directly so no tenant event races the snapshot below.
    let tenant = tenant_fixture(7);
    harness.store.tenant_insert(&tenant).await.unwrap();

    harness
        .cache
        .put(TenantFeatureSnapshot::new(TenantId::new(7), None).with_value("Chat", "false"))
        .await
        .unwrap();

    features.set_value(&tenant, "Chat", "true").await.unwrap();

    assert!(harness.wait_for_eviction(TenantId::new(7)).await);
}

#[tokio::test]
async fn deleted_edition_falls_back_to_catalog() {
    let harness = FeatureHarness::start(chat_catalog(), chat_edition());
    let features = &harness.features;
    harness
        .store
        .tenant_insert(&tenant_fixture(9).with_edition(EditionId::new(3)))
        .await
        .unwrap();
    harness
        .cache
        .put(TenantFeatureSnapshot::new(TenantId::new(9), Some(EditionId::new(3))))
        .await
        .unwrap();

    harness.bus.publish(LifecycleEvent::EditionDeleted {
        edition_id: EditionId::new(3),
    });

    assert!(harness.wait_for_eviction(TenantId::new(9)).await);
    assert_eq!(
        features.effective_value(TenantId::new(9), "Chat").await.unwrap(),
        Some("false".to_string())
    );
    assert_eq!(
        features.tenants().get(TenantId::new(9)).await.unwrap().edition_id,
        None
    );
}
