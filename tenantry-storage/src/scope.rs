//! Explicit tenant data scope.
//!
//! Every feature-setting query takes a [`TenantScope`] argument naming the
//! tenant whose rows are visible. There is no ambient tenant context: a
//! caller acting for one tenant can read another tenant's overrides only by
//! constructing that tenant's scope.

use tenantry_core::{TenantFeatureSetting, TenantId};

/// Visibility filter restricting queries to the rows owned by one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope {
    tenant_id: TenantId,
}

impl TenantScope {
    /// Scope covering every row owned by `tenant_id`.
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Whether a setting is visible inside this scope.
    pub fn contains(&self, setting: &TenantFeatureSetting) -> bool {
        setting.tenant_id == self.tenant_id
    }
}

impl From<TenantId> for TenantScope {
    fn from(tenant_id: TenantId) -> Self {
        Self::for_tenant(tenant_id)
    }
}
