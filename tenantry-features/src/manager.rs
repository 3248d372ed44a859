//! Feature manager facade.

use crate::{
    EditionFeatureResolver, FeatureCatalog, FeatureResolver, OverrideWriter, ResolvedFeatureValue,
    TenantManager, WriteOutcome,
};
use std::sync::Arc;
use tenantry_core::{
    EditionId, EffectiveFeatureValue, Tenant, TenantFeatureSetting, TenantId, TenantryConfig,
    TenantryResult,
};
use tenantry_events::EventBus;
use tenantry_storage::{FeatureSettingRepository, TenantRepository, TenantScope, UnitOfWork};

/// Entry point for reading and writing tenant features.
///
/// Reads go to the committed store without a transaction. Writes each run in
/// their own transaction through the [`OverrideWriter`].
pub struct FeatureManager<U>
where
    U: UnitOfWork + FeatureSettingRepository + TenantRepository,
{
    store: Arc<U>,
    resolver: FeatureResolver,
    writer: OverrideWriter<U>,
    tenants: TenantManager<U>,
}

impl<U> FeatureManager<U>
where
    U: UnitOfWork + FeatureSettingRepository + TenantRepository,
{
    /// Fails with a configuration error if `config` does not validate.
    pub fn new(
        store: Arc<U>,
        catalog: Arc<dyn FeatureCatalog>,
        editions: Arc<dyn EditionFeatureResolver>,
        config: &TenantryConfig,
    ) -> TenantryResult<Self> {
        config.validate()?;
        let resolver = FeatureResolver::new(catalog, editions);
        Ok(Self {
            writer: OverrideWriter::new(store.clone(), resolver.clone()),
            tenants: TenantManager::new(store.clone(), config),
            store,
            resolver,
        })
    }

    /// Publish feature and tenant change events on `bus`.
    pub fn with_bus(self, bus: EventBus) -> Self {
        Self {
            writer: self.writer.with_bus(bus.clone()),
            tenants: self.tenants.with_bus(bus),
            ..self
        }
    }

    pub fn store(&self) -> &Arc<U> {
        &self.store
    }

    pub fn resolver(&self) -> &FeatureResolver {
        &self.resolver
    }

    pub fn tenants(&self) -> &TenantManager<U> {
        &self.tenants
    }

    /// A tenant that does not exist has no edition; resolution still falls
    /// through to the catalog.
    async fn edition_of(&self, tenant_id: TenantId) -> TenantryResult<Option<EditionId>> {
        Ok(self
            .store
            .tenant_get(tenant_id)
            .await?
            .and_then(|tenant| tenant.edition_id))
    }

    /// The value `name` is in effect with for a tenant.
    pub async fn effective_value(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> TenantryResult<Option<String>> {
        Ok(self
            .resolve(tenant_id, name)
            .await?
            .map(|resolved| resolved.value))
    }

    /// Like [`effective_value`](Self::effective_value), with the supplying layer.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> TenantryResult<Option<ResolvedFeatureValue>> {
        let edition_id = self.edition_of(tenant_id).await?;
        self.resolver
            .resolve(self.store.as_ref(), tenant_id, edition_id, name)
            .await
    }

    /// Every catalog feature's effective value, in catalog order.
    pub async fn effective_values(
        &self,
        tenant_id: TenantId,
    ) -> TenantryResult<Vec<EffectiveFeatureValue>> {
        Ok(self
            .resolved_values(tenant_id)
            .await?
            .into_iter()
            .map(EffectiveFeatureValue::from)
            .collect())
    }

    pub async fn resolved_values(
        &self,
        tenant_id: TenantId,
    ) -> TenantryResult<Vec<ResolvedFeatureValue>> {
        let edition_id = self.edition_of(tenant_id).await?;
        self.resolver
            .resolve_all(self.store.as_ref(), tenant_id, edition_id)
            .await
    }

    pub async fn set_value(
        &self,
        tenant: &Tenant,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        self.writer.set_value(tenant, name, value).await
    }

    pub async fn set_value_by_id(
        &self,
        tenant_id: TenantId,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        self.writer.set_value_by_id(tenant_id, name, value).await
    }

    pub async fn set_values(
        &self,
        tenant_id: TenantId,
        values: &[(&str, &str)],
    ) -> TenantryResult<Vec<WriteOutcome>> {
        self.writer.set_values(tenant_id, values).await
    }

    pub async fn reset_all(&self, tenant_id: TenantId) -> TenantryResult<u64> {
        self.writer.reset_all(tenant_id).await
    }

    /// Stored override rows of a tenant, orphans included.
    pub async fn overrides(&self, tenant_id: TenantId) -> TenantryResult<Vec<TenantFeatureSetting>> {
        self.store
            .setting_list(TenantScope::for_tenant(tenant_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StaticEditionFeatures, StaticFeatureCatalog};
    use tenantry_core::{ConfigError, FeatureDefinition, TenantryError};
    use tenantry_storage::InMemoryStore;

    fn manager() -> FeatureManager<InMemoryStore> {
        let catalog = StaticFeatureCatalog::new()
            .with_feature(FeatureDefinition::new("Chat", "false"))
            .with_feature(FeatureDefinition::new("MaxUsers", "10"));
        let editions = StaticEditionFeatures::new().with_value(EditionId::new(3), "Chat", "true");
        FeatureManager::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(catalog),
            Arc::new(editions),
            &TenantryConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = FeatureManager::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticFeatureCatalog::new()),
            Arc::new(StaticEditionFeatures::new()),
            &TenantryConfig::default().with_tenancy_name_max_length(1),
        );
        match result {
            Err(TenantryError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "tenancy_name_max_length");
            }
            Err(other) => panic!("Expected config error, got {:?}", other),
            Ok(_) => panic!("Expected config error, got a manager"),
        }
    }

    #[tokio::test]
    async fn test_missing_tenant_resolves_to_catalog() {
        let manager = manager();
        assert_eq!(
            manager.effective_value(TenantId::new(404), "Chat").await.unwrap(),
            Some("false".to_string())
        );
    }

    #[tokio::test]
    async fn test_edition_picked_up_from_stored_tenant() {
        let manager = manager();
        manager
            .tenants()
            .create(Tenant::new(TenantId::new(9), "nine", "Nine").with_edition(EditionId::new(3)))
            .await
            .unwrap();

        let values = manager.effective_values(TenantId::new(9)).await.unwrap();
        assert_eq!(
            values,
            vec![
                EffectiveFeatureValue::new("Chat", "true"),
                EffectiveFeatureValue::new("MaxUsers", "10"),
            ]
        );
    }

    #[tokio::test]
    async fn test_overrides_include_orphans() {
        let manager = manager();
        manager
            .store()
            .setting_insert(&TenantFeatureSetting::new(TenantId::new(7), "Retired", "on"))
            .await
            .unwrap();

        let overrides = manager.overrides(TenantId::new(7)).await.unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(manager.effective_values(TenantId::new(7)).await.unwrap().len(), 2);
    }
}
