//! Tenantry Test Utilities
//!
//! Shared test infrastructure for the tenantry workspace:
//! - Proptest generators for identifiers, names and feature values
//! - Fixtures for the catalogs, editions and tenants tests keep rebuilding
//! - A wired-up harness with store, bus, cache and running invalidator
//! - Assertions for the user-facing error kinds
//! - Tracing initialisation

// Re-export the in-memory backends from their source crate
pub use tenantry_storage::{InMemoryFeatureCache, InMemoryStore};

// Re-export core types for convenience
pub use tenantry_core::{
    EditionId, EffectiveFeatureValue, FeatureDefinition, Tenant, TenantError, TenantFeatureSetting,
    TenantId, TenantryConfig, TenantryError, TenantryResult, ValidationError,
};

use std::sync::Arc;
use tenantry_events::{spawn_invalidator, CacheInvalidator, EventBus};
use tenantry_features::{FeatureManager, StaticEditionFeatures, StaticFeatureCatalog};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber.
///
/// Honours `RUST_LOG`; defaults to debug output from the tenantry crates.
/// Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("tenantry_features=debug,tenantry_events=debug,tenantry_storage=debug,warn")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for tenantry types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_tenant_id() -> impl Strategy<Value = TenantId> {
        (1..10_000i32).prop_map(TenantId::new)
    }

    pub fn arb_edition_id() -> impl Strategy<Value = EditionId> {
        (1..100i32).prop_map(EditionId::new)
    }

    /// Names accepted by tenancy name validation.
    pub fn arb_tenancy_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_-]{1,30}"
    }

    pub fn arb_feature_name() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z]{0,8}"
    }

    /// Feature values, including the empty string.
    pub fn arb_feature_value() -> impl Strategy<Value = String> {
        "[a-z0-9]{0,6}"
    }

    /// A catalog of up to eight features with distinct names.
    pub fn arb_catalog() -> impl Strategy<Value = StaticFeatureCatalog> {
        proptest::collection::btree_map(arb_feature_name(), arb_feature_value(), 1..8).prop_map(
            |features| {
                features
                    .into_iter()
                    .map(|(name, default)| FeatureDefinition::new(name, default))
                    .collect::<StaticFeatureCatalog>()
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    /// Catalog with a single `Chat` feature defaulting to `"false"`.
    pub fn chat_catalog() -> StaticFeatureCatalog {
        StaticFeatureCatalog::new().with_feature(FeatureDefinition::new("Chat", "false"))
    }

    /// Catalog with `Chat`, `MaxUsers` and `Audit`, in that order.
    pub fn standard_catalog() -> StaticFeatureCatalog {
        chat_catalog()
            .with_feature(FeatureDefinition::new("MaxUsers", "10").with_display_name("Maximum users"))
            .with_feature(FeatureDefinition::new("Audit", "true"))
    }

    /// Edition 3 turns `Chat` on.
    pub fn chat_edition() -> StaticEditionFeatures {
        StaticEditionFeatures::new().with_value(EditionId::new(3), "Chat", "true")
    }

    /// Active tenant named `tenant-{id}` with no edition.
    pub fn tenant_fixture(id: i32) -> Tenant {
        Tenant::new(TenantId::new(id), format!("tenant-{}", id), format!("Tenant {}", id))
    }

    /// Store, bus, cache, manager and a running invalidator, wired together.
    ///
    /// The invalidator task is aborted when the harness is dropped.
    pub struct FeatureHarness {
        pub store: Arc<InMemoryStore>,
        pub cache: Arc<InMemoryFeatureCache>,
        pub bus: EventBus,
        pub editions: Arc<StaticEditionFeatures>,
        pub features: FeatureManager<InMemoryStore>,
        invalidator: JoinHandle<()>,
    }

    impl FeatureHarness {
        /// Must be called from inside a tokio runtime.
        pub fn start(catalog: StaticFeatureCatalog, editions: StaticEditionFeatures) -> Self {
            let config = TenantryConfig::default();
            let store = Arc::new(InMemoryStore::new());
            let cache = Arc::new(InMemoryFeatureCache::new());
            let bus = EventBus::from_config(&config);
            let editions = Arc::new(editions);

            let features = FeatureManager::new(
                store.clone(),
                Arc::new(catalog),
                editions.clone(),
                &config,
            )
            .expect("default config validates")
            .with_bus(bus.clone());

            let invalidator = Arc::new(
                CacheInvalidator::new(store.clone(), cache.clone(), &config).with_bus(bus.clone()),
            );
            let invalidator = spawn_invalidator(invalidator, bus.subscribe());

            Self {
                store,
                cache,
                bus,
                editions,
                features,
                invalidator,
            }
        }

        /// Yield to the invalidator until `tenant_id` has no cached snapshot.
        pub async fn wait_for_eviction(&self, tenant_id: TenantId) -> bool {
            for _ in 0..1_000 {
                if !self.cache.contains(tenant_id).await {
                    return true;
                }
                tokio::task::yield_now().await;
            }
            false
        }
    }

    impl Drop for FeatureHarness {
        fn drop(&mut self) {
            self.invalidator.abort();
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for the user-facing error kinds.

    use super::*;

    /// Assert that a result is the "no such tenant" failure for `tenant_id`.
    pub fn assert_tenant_not_found<T: std::fmt::Debug>(
        result: &TenantryResult<T>,
        tenant_id: TenantId,
    ) {
        match result {
            Err(TenantryError::Tenant(TenantError::NotFound { tenant_id: id })) => {
                assert_eq!(*id, tenant_id, "NotFound for the wrong tenant");
            }
            other => panic!("Expected tenant NotFound, got {:?}", other),
        }
    }

    /// Assert that a result is a tenancy name conflict.
    pub fn assert_conflict<T: std::fmt::Debug>(result: &TenantryResult<T>) {
        assert!(
            matches!(
                result,
                Err(TenantryError::Tenant(TenantError::DuplicateTenancyName { .. }))
            ),
            "Expected DuplicateTenancyName, got {:?}",
            result
        );
    }

    /// Assert that a result is a validation failure.
    pub fn assert_validation_failure<T: std::fmt::Debug>(result: &TenantryResult<T>) {
        assert!(
            matches!(result, Err(TenantryError::Validation(_))),
            "Expected validation error, got {:?}",
            result
        );
    }

    /// Assert that a result is a storage failure.
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &TenantryResult<T>) {
        assert!(
            matches!(result, Err(TenantryError::Storage(_))),
            "Expected storage error, got {:?}",
            result
        );
    }
}
