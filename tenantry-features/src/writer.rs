//! Override writer.
//!
//! Decides, for a desired value, whether a tenant's explicit override must
//! be inserted, updated or removed. Overrides are only ever stored when they
//! differ from the applicable default, so edition default changes reach
//! every tenant that has not explicitly diverged.

use crate::FeatureResolver;
use std::sync::Arc;
use tenantry_core::{Tenant, TenantFeatureSetting, TenantId, TenantryError, TenantryResult};
use tenantry_events::{EventBus, LifecycleEvent};
use tenantry_storage::{
    FeatureSettingRepository, StoreTransaction, TenantRepository, TenantScope, UnitOfWork,
};
use tracing::{debug, info};

/// What a single assignment did to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOutcome {
    /// Nothing was written.
    Unchanged,
    /// A new override row was stored.
    Inserted,
    /// An existing override row got a new value.
    Updated,
    /// An existing override row was deleted.
    Removed,
}

impl WriteOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Transactional writer for tenant feature overrides.
pub struct OverrideWriter<U: UnitOfWork> {
    store: Arc<U>,
    resolver: FeatureResolver,
    bus: Option<EventBus>,
}

impl<U: UnitOfWork> OverrideWriter<U> {
    pub fn new(store: Arc<U>, resolver: FeatureResolver) -> Self {
        Self {
            store,
            resolver,
            bus: None,
        }
    }

    /// Publish `FeatureSettingsChanged` after every commit that changed rows.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Assign `value` to `name` for a loaded tenant, in one transaction.
    pub async fn set_value(
        &self,
        tenant: &Tenant,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        let tx = self.store.begin().await?;
        let outcome = self.apply(&tx, tenant, name, value).await?;
        tx.commit().await?;

        if outcome.is_change() {
            self.notify(tenant.tenant_id);
        }
        Ok(outcome)
    }

    /// Load the tenant, then assign as [`set_value`](Self::set_value) does.
    pub async fn set_value_by_id(
        &self,
        tenant_id: TenantId,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        let tx = self.store.begin().await?;
        let tenant = load_tenant(&tx, tenant_id).await?;
        let outcome = self.apply(&tx, &tenant, name, value).await?;
        tx.commit().await?;

        if outcome.is_change() {
            self.notify(tenant_id);
        }
        Ok(outcome)
    }

    /// Apply each assignment in order inside a single transaction.
    ///
    /// Any failure drops the transaction, so either every assignment lands
    /// or none does. An empty batch does nothing, not even a tenant lookup.
    pub async fn set_values(
        &self,
        tenant_id: TenantId,
        values: &[(&str, &str)],
    ) -> TenantryResult<Vec<WriteOutcome>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.store.begin().await?;
        let tenant = load_tenant(&tx, tenant_id).await?;

        let mut outcomes = Vec::with_capacity(values.len());
        for (name, value) in values {
            outcomes.push(self.apply(&tx, &tenant, name, value).await?);
        }
        tx.commit().await?;

        if outcomes.iter().any(WriteOutcome::is_change) {
            self.notify(tenant_id);
        }
        Ok(outcomes)
    }

    /// Delete every override of a tenant, returning how many were removed.
    pub async fn reset_all(&self, tenant_id: TenantId) -> TenantryResult<u64> {
        let tx = self.store.begin().await?;
        let removed = tx
            .setting_delete_all(TenantScope::for_tenant(tenant_id))
            .await?;
        tx.commit().await?;

        info!(tenant_id = %tenant_id, removed, "Reset tenant feature overrides");
        if removed > 0 {
            self.notify(tenant_id);
        }
        Ok(removed)
    }

    /// The decision procedure for one assignment, run inside `tx`.
    async fn apply<T: StoreTransaction>(
        &self,
        tx: &T,
        tenant: &Tenant,
        name: &str,
        value: &str,
    ) -> TenantryResult<WriteOutcome> {
        let tenant_id = tenant.tenant_id;
        let scope = TenantScope::for_tenant(tenant_id);

        let current = self
            .resolver
            .resolve(tx, tenant_id, tenant.edition_id, name)
            .await?;
        if current.as_ref().is_some_and(|resolved| resolved.value == value) {
            debug!(tenant_id = %tenant_id, feature = name, "Feature value already in effect");
            return Ok(WriteOutcome::Unchanged);
        }

        let existing = tx.setting_find(scope, name).await?;

        if !self.resolver.catalog().contains(name) {
            debug!(tenant_id = %tenant_id, feature = name, "Feature not in catalog, no override kept");
            return remove_existing(tx, scope, existing).await;
        }

        let default = self
            .resolver
            .applicable_default(tx, tenant_id, tenant.edition_id, name)
            .await?;
        if default.as_deref() == Some(value) {
            return remove_existing(tx, scope, existing).await;
        }

        match existing {
            None => {
                tx.setting_insert(&TenantFeatureSetting::new(tenant_id, name, value))
                    .await?;
                info!(tenant_id = %tenant_id, feature = name, "Stored feature override");
                Ok(WriteOutcome::Inserted)
            }
            Some(mut setting) => {
                setting.value = value.to_string();
                tx.setting_update(&setting).await?;
                info!(tenant_id = %tenant_id, feature = name, "Updated feature override");
                Ok(WriteOutcome::Updated)
            }
        }
    }

    fn notify(&self, tenant_id: TenantId) {
        if let Some(bus) = &self.bus {
            bus.publish(LifecycleEvent::FeatureSettingsChanged { tenant_id });
        }
    }
}

async fn load_tenant<T>(tx: &T, tenant_id: TenantId) -> TenantryResult<Tenant>
where
    T: TenantRepository + ?Sized,
{
    tx.tenant_get(tenant_id)
        .await?
        .ok_or_else(|| TenantryError::tenant_not_found(tenant_id))
}

async fn remove_existing<T: FeatureSettingRepository + ?Sized>(
    tx: &T,
    scope: TenantScope,
    existing: Option<TenantFeatureSetting>,
) -> TenantryResult<WriteOutcome> {
    match existing {
        Some(setting) => {
            tx.setting_delete(scope, &setting.name).await?;
            info!(
                tenant_id = %setting.tenant_id,
                feature = %setting.name,
                "Removed feature override"
            );
            Ok(WriteOutcome::Removed)
        }
        None => Ok(WriteOutcome::Unchanged),
    }
}
