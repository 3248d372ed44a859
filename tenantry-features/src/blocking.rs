//! Blocking facade over [`FeatureManager`].
//!
//! Owns a current-thread tokio runtime and drives the async operations to
//! completion on it, so blocking and async callers get identical semantics.
//! Must not be used from inside an async context: `block_on` panics there.

use crate::{FeatureManager, ResolvedFeatureValue, WriteOutcome};
use tenantry_core::{
    EffectiveFeatureValue, Tenant, TenantFeatureSetting, TenantId, TenantryError, TenantryResult,
};
use tenantry_storage::{FeatureSettingRepository, TenantRepository, UnitOfWork};
use tokio::runtime::{Builder, Runtime};

/// Synchronous feature manager.
pub struct BlockingFeatureManager<U>
where
    U: UnitOfWork + FeatureSettingRepository + TenantRepository,
{
    inner: FeatureManager<U>,
    runtime: Runtime,
}

impl<U> BlockingFeatureManager<U>
where
    U: UnitOfWork + FeatureSettingRepository + TenantRepository,
{
    pub fn new(inner: FeatureManager<U>) -> TenantryResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TenantryError::Runtime {
                reason: e.to_string(),
            })?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &FeatureManager<U> {
        &self.inner
    }

    pub fn effective_value(&self, tenant_id: TenantId, name: &str) -> TenantryResult<Option<String>> {
        self.runtime
            .block_on(self.inner.effective_value(tenant_id, name))
    }

    pub fn resolve(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> TenantryResult<Option<ResolvedFeatureValue>> {
        self.runtime.block_on(self.inner.resolve(tenant_id, name))
    }

    pub fn effective_values(&self, tenant_id: TenantId) -> TenantryResult<Vec<EffectiveFeatureValue>> {
        self.runtime.block_on(self.inner.effective_values(tenant_id))
    }

    pub fn resolved_values(&self, tenant_id: TenantId) -> TenantryResult<Vec<ResolvedFeatureValue>> {
        self.runtime.block_on(self.inner.resolved_values(tenant_id))
    }

    pub fn set_value(&self, tenant: &Tenant, name: &str, value: &str) -> TenantryResult<WriteOutcome> {
        self.runtime
            .block_on(self.inner.set_value(tenant, name, value))
    }

    pub fn set_value_by_id(
        &self,
        tenant_id: TenantId,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        self.runtime
            .block_on(self.inner.set_value_by_id(tenant_id, name, value))
    }

    pub fn set_values(
        &self,
        tenant_id: TenantId,
        values: &[(&str, &str)],
    ) -> TenantryResult<Vec<WriteOutcome>> {
        self.runtime
            .block_on(self.inner.set_values(tenant_id, values))
    }

    pub fn reset_all(&self, tenant_id: TenantId) -> TenantryResult<u64> {
        self.runtime.block_on(self.inner.reset_all(tenant_id))
    }

    pub fn overrides(&self, tenant_id: TenantId) -> TenantryResult<Vec<TenantFeatureSetting>> {
        self.runtime.block_on(self.inner.overrides(tenant_id))
    }

    pub fn create_tenant(&self, tenant: Tenant) -> TenantryResult<Tenant> {
        self.runtime.block_on(self.inner.tenants().create(tenant))
    }

    pub fn update_tenant(&self, tenant: Tenant) -> TenantryResult<Tenant> {
        self.runtime.block_on(self.inner.tenants().update(tenant))
    }

    pub fn delete_tenant(&self, tenant_id: TenantId) -> TenantryResult<()> {
        self.runtime.block_on(self.inner.tenants().delete(tenant_id))
    }

    pub fn get_tenant(&self, tenant_id: TenantId) -> TenantryResult<Tenant> {
        self.runtime.block_on(self.inner.tenants().get(tenant_id))
    }

    pub fn find_tenant_by_tenancy_name(&self, tenancy_name: &str) -> TenantryResult<Option<Tenant>> {
        self.runtime
            .block_on(self.inner.tenants().find_by_tenancy_name(tenancy_name))
    }
}
