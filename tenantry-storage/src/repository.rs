//! Async repository traits for tenants and feature settings.
//!
//! Both the store itself (auto-committing reads and writes) and every open
//! transaction implement these traits, so resolution logic can run against
//! either without knowing which one it holds.

use crate::TenantScope;
use async_trait::async_trait;
use tenantry_core::{EditionId, Tenant, TenantFeatureSetting, TenantId, TenantryResult};

/// Persistence of explicit per-tenant feature overrides.
///
/// Implementations must keep at most one setting per `(tenant_id, name)`.
#[async_trait]
pub trait FeatureSettingRepository: Send + Sync {
    /// Find the override for `name` among the rows visible in `scope`.
    async fn setting_find(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> TenantryResult<Option<TenantFeatureSetting>>;

    /// List every override visible in `scope`, ordered by feature name.
    async fn setting_list(&self, scope: TenantScope) -> TenantryResult<Vec<TenantFeatureSetting>>;

    /// Insert a new override. Fails if the `(tenant_id, name)` pair exists.
    async fn setting_insert(&self, setting: &TenantFeatureSetting) -> TenantryResult<()>;

    /// Replace the value of an existing override.
    async fn setting_update(&self, setting: &TenantFeatureSetting) -> TenantryResult<()>;

    /// Delete the override for `name` in `scope`. Deleting a missing row is a no-op.
    async fn setting_delete(&self, scope: TenantScope, name: &str) -> TenantryResult<()>;

    /// Delete every override in `scope`, returning how many rows went away.
    async fn setting_delete_all(&self, scope: TenantScope) -> TenantryResult<u64>;
}

/// Persistence of tenants, as far as the feature engine needs it.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Get a tenant by ID. Soft-deleted tenants are not returned.
    async fn tenant_get(&self, id: TenantId) -> TenantryResult<Option<Tenant>>;

    /// Find a non-deleted tenant by tenancy name (case-insensitive).
    async fn tenant_find_by_tenancy_name(&self, tenancy_name: &str)
        -> TenantryResult<Option<Tenant>>;

    /// List non-deleted tenants assigned to an edition.
    async fn tenant_list_by_edition(&self, edition_id: EditionId) -> TenantryResult<Vec<Tenant>>;

    /// Insert a new tenant.
    async fn tenant_insert(&self, tenant: &Tenant) -> TenantryResult<()>;

    /// Update an existing tenant.
    async fn tenant_update(&self, tenant: &Tenant) -> TenantryResult<()>;
}
