//! Effective feature value resolution.
//!
//! A feature's effective value for a tenant is the first value supplied by
//! the layers in [`FeatureLayer::ORDER`]:
//!
//! ```text
//! tenant override  ->  edition value  ->  catalog default
//! ```
//!
//! Absence at a layer falls through to the next; absence everywhere is
//! `None`, never an error.

use crate::{EditionFeatureResolver, FeatureCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tenantry_core::{EditionId, EffectiveFeatureValue, TenantId, TenantryResult};
use tenantry_storage::{FeatureSettingRepository, TenantScope};
use tracing::debug;

/// A source of feature values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureLayer {
    /// Explicit per-tenant override.
    Tenant,
    /// Value of the tenant's edition.
    Edition,
    /// Catalog-wide default.
    Catalog,
}

impl FeatureLayer {
    /// Lookup order for an effective value.
    pub const ORDER: [FeatureLayer; 3] = [Self::Tenant, Self::Edition, Self::Catalog];

    /// Lookup order for the default a tenant override is measured against.
    pub const DEFAULTS: [FeatureLayer; 2] = [Self::Edition, Self::Catalog];
}

/// An effective value together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFeatureValue {
    pub name: String,
    pub value: String,
    pub source: FeatureLayer,
}

impl ResolvedFeatureValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>, source: FeatureLayer) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source,
        }
    }

    pub fn is_override(&self) -> bool {
        self.source == FeatureLayer::Tenant
    }
}

impl From<ResolvedFeatureValue> for EffectiveFeatureValue {
    fn from(resolved: ResolvedFeatureValue) -> Self {
        EffectiveFeatureValue::new(resolved.name, resolved.value)
    }
}

/// Three-layer resolution over a feature setting repository.
///
/// The repository is passed per call so the same resolver runs against the
/// committed store for reads and against an open transaction for writes.
#[derive(Clone)]
pub struct FeatureResolver {
    catalog: Arc<dyn FeatureCatalog>,
    editions: Arc<dyn EditionFeatureResolver>,
}

impl FeatureResolver {
    pub fn new(catalog: Arc<dyn FeatureCatalog>, editions: Arc<dyn EditionFeatureResolver>) -> Self {
        Self { catalog, editions }
    }

    pub fn catalog(&self) -> &dyn FeatureCatalog {
        self.catalog.as_ref()
    }

    /// The value a single layer supplies for `name`, if any.
    pub async fn layer_value<R>(
        &self,
        repo: &R,
        layer: FeatureLayer,
        tenant_id: TenantId,
        edition_id: Option<EditionId>,
        name: &str,
    ) -> TenantryResult<Option<String>>
    where
        R: FeatureSettingRepository + ?Sized,
    {
        match layer {
            FeatureLayer::Tenant => Ok(repo
                .setting_find(TenantScope::for_tenant(tenant_id), name)
                .await?
                .map(|setting| setting.value)),
            FeatureLayer::Edition => match edition_id {
                Some(edition_id) => self.editions.feature_value(edition_id, name).await,
                None => Ok(None),
            },
            FeatureLayer::Catalog => Ok(self
                .catalog
                .get(name)
                .map(|feature| feature.default_value.clone())),
        }
    }

    async fn first_value<R>(
        &self,
        repo: &R,
        layers: &[FeatureLayer],
        tenant_id: TenantId,
        edition_id: Option<EditionId>,
        name: &str,
    ) -> TenantryResult<Option<ResolvedFeatureValue>>
    where
        R: FeatureSettingRepository + ?Sized,
    {
        for &layer in layers {
            if let Some(value) = self
                .layer_value(repo, layer, tenant_id, edition_id, name)
                .await?
            {
                return Ok(Some(ResolvedFeatureValue::new(name, value, layer)));
            }
        }
        Ok(None)
    }

    /// Resolve `name` for a tenant, reporting which layer supplied the value.
    ///
    /// Unknown features still resolve to an existing override.
    pub async fn resolve<R>(
        &self,
        repo: &R,
        tenant_id: TenantId,
        edition_id: Option<EditionId>,
        name: &str,
    ) -> TenantryResult<Option<ResolvedFeatureValue>>
    where
        R: FeatureSettingRepository + ?Sized,
    {
        let resolved = self
            .first_value(repo, &FeatureLayer::ORDER, tenant_id, edition_id, name)
            .await?;
        debug!(
            tenant_id = %tenant_id,
            feature = name,
            source = ?resolved.as_ref().map(|r| r.source),
            "Resolved feature value"
        );
        Ok(resolved)
    }

    /// The default an override of `name` is compared against: the edition
    /// value if the edition sets one, otherwise the catalog default.
    pub async fn applicable_default<R>(
        &self,
        repo: &R,
        tenant_id: TenantId,
        edition_id: Option<EditionId>,
        name: &str,
    ) -> TenantryResult<Option<String>>
    where
        R: FeatureSettingRepository + ?Sized,
    {
        Ok(self
            .first_value(repo, &FeatureLayer::DEFAULTS, tenant_id, edition_id, name)
            .await?
            .map(|resolved| resolved.value))
    }

    /// Resolve every catalog feature, in catalog order.
    ///
    /// Overrides are loaded once. Orphaned overrides for features missing
    /// from the catalog are skipped.
    pub async fn resolve_all<R>(
        &self,
        repo: &R,
        tenant_id: TenantId,
        edition_id: Option<EditionId>,
    ) -> TenantryResult<Vec<ResolvedFeatureValue>>
    where
        R: FeatureSettingRepository + ?Sized,
    {
        let mut overrides: HashMap<String, String> = repo
            .setting_list(TenantScope::for_tenant(tenant_id))
            .await?
            .into_iter()
            .map(|setting| (setting.name, setting.value))
            .collect();

        let features = self.catalog.all();
        let mut resolved = Vec::with_capacity(features.len());
        for feature in features {
            let value = match overrides.remove(&feature.name) {
                Some(value) => ResolvedFeatureValue::new(&feature.name, value, FeatureLayer::Tenant),
                None => self
                    .first_value(repo, &FeatureLayer::DEFAULTS, tenant_id, edition_id, &feature.name)
                    .await?
                    .unwrap_or_else(|| {
                        ResolvedFeatureValue::new(
                            &feature.name,
                            &feature.default_value,
                            FeatureLayer::Catalog,
                        )
                    }),
            };
            resolved.push(value);
        }

        if !overrides.is_empty() {
            debug!(
                tenant_id = %tenant_id,
                orphans = overrides.len(),
                "Skipped overrides for features missing from catalog"
            );
        }
        Ok(resolved)
    }
}

impl std::fmt::Debug for FeatureResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureResolver")
            .field("features", &self.catalog.all().len())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::{StaticEditionFeatures, StaticFeatureCatalog};
    use proptest::prelude::*;
    use tenantry_core::{FeatureDefinition, TenantFeatureSetting};
    use tenantry_storage::InMemoryStore;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    proptest! {
        /// With no override, the effective value is the edition value when
        /// the edition sets one and the catalog default otherwise.
        #[test]
        fn prop_no_override_resolves_to_default(
            catalog_default in "[a-z]{0,6}",
            edition_value in proptest::option::of("[a-z]{0,6}"),
            has_edition in any::<bool>(),
        ) {
            let catalog = StaticFeatureCatalog::new()
                .with_feature(FeatureDefinition::new("F", catalog_default.clone()));
            let mut editions = StaticEditionFeatures::new();
            if let Some(value) = &edition_value {
                editions = editions.with_value(EditionId::new(1), "F", value.clone());
            }
            let resolver = FeatureResolver::new(Arc::new(catalog), Arc::new(editions));
            let edition_id = has_edition.then(|| EditionId::new(1));
            let store = InMemoryStore::new();

            let resolved = runtime()
                .block_on(resolver.resolve(&store, TenantId::new(1), edition_id, "F"))
                .unwrap()
                .unwrap();

            let expected = match (has_edition, edition_value) {
                (true, Some(value)) => value,
                _ => catalog_default,
            };
            prop_assert_eq!(resolved.value, expected);
        }

        /// An override always wins, whatever the defaults are.
        #[test]
        fn prop_override_wins(
            catalog_default in "[a-z]{0,6}",
            edition_value in "[a-z]{0,6}",
            override_value in "[a-z]{0,6}",
        ) {
            let catalog = StaticFeatureCatalog::new()
                .with_feature(FeatureDefinition::new("F", catalog_default));
            let editions = StaticEditionFeatures::new().with_value(EditionId::new(1), "F", edition_value);
            let resolver = FeatureResolver::new(Arc::new(catalog), Arc::new(editions));
            let store = InMemoryStore::new();

            let rt = runtime();
            rt.block_on(store.setting_insert(&TenantFeatureSetting::new(
                TenantId::new(1),
                "F",
                override_value.clone(),
            )))
            .unwrap();
            let resolved = rt
                .block_on(resolver.resolve(&store, TenantId::new(1), Some(EditionId::new(1)), "F"))
                .unwrap()
                .unwrap();

            prop_assert_eq!(resolved.value, override_value);
            prop_assert_eq!(resolved.source, FeatureLayer::Tenant);
        }
    }
}
