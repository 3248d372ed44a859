//! Tenant manager.
//!
//! Every failure here is detected before the first mutating store call, so
//! a rejected request leaves nothing behind.

use chrono::Utc;
use std::sync::Arc;
use tenantry_core::{
    validate_tenancy_name, Tenant, TenantError, TenantId, TenantryConfig, TenantryError,
    TenantryResult,
};
use tenantry_events::{EntityChange, EventBus, LifecycleEvent};
use tenantry_storage::{StoreTransaction, TenantRepository, UnitOfWork};
use tracing::info;

/// Create, update and soft-delete tenants.
pub struct TenantManager<U: UnitOfWork> {
    store: Arc<U>,
    bus: Option<EventBus>,
    tenancy_name_max_length: usize,
}

impl<U: UnitOfWork> TenantManager<U> {
    pub fn new(store: Arc<U>, config: &TenantryConfig) -> Self {
        Self {
            store,
            bus: None,
            tenancy_name_max_length: config.tenancy_name_max_length,
        }
    }

    /// Publish a `TenantChanged` event after every committed change.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Store a new tenant. The tenancy name must be valid and unused.
    pub async fn create(&self, tenant: Tenant) -> TenantryResult<Tenant> {
        validate_tenancy_name(&tenant.tenancy_name, self.tenancy_name_max_length)?;

        let tx = self.store.begin().await?;
        if tx
            .tenant_find_by_tenancy_name(&tenant.tenancy_name)
            .await?
            .is_some()
        {
            return Err(duplicate_name(&tenant.tenancy_name));
        }
        tx.tenant_insert(&tenant).await?;
        tx.commit().await?;

        info!(tenant_id = %tenant.tenant_id, tenancy_name = %tenant.tenancy_name, "Created tenant");
        self.publish(tenant.tenant_id, EntityChange::Created);
        Ok(tenant)
    }

    /// Replace a stored tenant. Keeping its own tenancy name is not a conflict.
    pub async fn update(&self, mut tenant: Tenant) -> TenantryResult<Tenant> {
        validate_tenancy_name(&tenant.tenancy_name, self.tenancy_name_max_length)?;

        let tx = self.store.begin().await?;
        let stored = tx
            .tenant_get(tenant.tenant_id)
            .await?
            .ok_or_else(|| TenantryError::tenant_not_found(tenant.tenant_id))?;
        if let Some(holder) = tx.tenant_find_by_tenancy_name(&tenant.tenancy_name).await? {
            if holder.tenant_id != tenant.tenant_id {
                return Err(duplicate_name(&tenant.tenancy_name));
            }
        }

        tenant.created_at = stored.created_at;
        tenant.updated_at = Utc::now();
        tx.tenant_update(&tenant).await?;
        tx.commit().await?;

        info!(tenant_id = %tenant.tenant_id, "Updated tenant");
        self.publish(tenant.tenant_id, EntityChange::Updated);
        Ok(tenant)
    }

    /// Soft-delete a tenant. Its feature overrides are left in place.
    pub async fn delete(&self, tenant_id: TenantId) -> TenantryResult<()> {
        let tx = self.store.begin().await?;
        let mut tenant = tx
            .tenant_get(tenant_id)
            .await?
            .ok_or_else(|| TenantryError::tenant_not_found(tenant_id))?;

        tenant.is_deleted = true;
        tenant.updated_at = Utc::now();
        tx.tenant_update(&tenant).await?;
        tx.commit().await?;

        info!(tenant_id = %tenant_id, "Deleted tenant");
        self.publish(tenant_id, EntityChange::Deleted);
        Ok(())
    }

    /// Load a tenant, failing if it does not exist or was deleted.
    pub async fn get(&self, tenant_id: TenantId) -> TenantryResult<Tenant> {
        let tx = self.store.begin().await?;
        tx.tenant_get(tenant_id)
            .await?
            .ok_or_else(|| TenantryError::tenant_not_found(tenant_id))
    }

    pub async fn find_by_tenancy_name(&self, tenancy_name: &str) -> TenantryResult<Option<Tenant>> {
        let tx = self.store.begin().await?;
        tx.tenant_find_by_tenancy_name(tenancy_name).await
    }

    fn publish(&self, tenant_id: TenantId, change: EntityChange) {
        if let Some(bus) = &self.bus {
            bus.publish(LifecycleEvent::tenant_changed(tenant_id, change));
        }
    }
}

fn duplicate_name(tenancy_name: &str) -> TenantryError {
    TenantError::DuplicateTenancyName {
        tenancy_name: tenancy_name.to_string(),
    }
    .into()
}
