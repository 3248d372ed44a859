//! Entity types for tenants and feature settings

use crate::{EditionId, TenantId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Entity type discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Tenant,
    TenantFeatureSetting,
}

/// A tenant - an isolated customer unit with an optional edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: TenantId,
    /// Unique, URL-safe name used to address the tenant.
    pub tenancy_name: String,
    /// Display name.
    pub name: String,
    /// Edition supplying feature defaults, if any.
    pub edition_id: Option<EditionId>,
    pub is_active: bool,
    /// Soft delete marker. Deleted tenants are invisible to lookups.
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tenant {
    /// Create an active tenant with no edition.
    pub fn new(tenant_id: TenantId, tenancy_name: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            tenancy_name: tenancy_name.into(),
            name: name.into(),
            edition_id: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style edition assignment.
    pub fn with_edition(mut self, edition_id: EditionId) -> Self {
        self.edition_id = Some(edition_id);
        self
    }
}

/// An explicit per-tenant feature override.
///
/// At most one record exists per `(tenant_id, name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFeatureSetting {
    pub tenant_id: TenantId,
    /// Feature name.
    pub name: String,
    /// Override value. May be empty, never absent.
    pub value: String,
    pub created_at: Timestamp,
}

impl TenantFeatureSetting {
    pub fn new(tenant_id: TenantId, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tenant_id,
            name: name.into(),
            value: value.into(),
            created_at: Utc::now(),
        }
    }

    /// Storage key in the form `tenant_id/name`, used in error messages.
    pub fn key(&self) -> String {
        format!("{}/{}", self.tenant_id, self.name)
    }
}

/// A feature known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    /// Unique feature name.
    pub name: String,
    /// Value in effect when neither tenant nor edition overrides it.
    pub default_value: String,
    pub display_name: Option<String>,
}

impl FeatureDefinition {
    pub fn new(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// The value a feature resolves to for a tenant. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveFeatureValue {
    pub name: String,
    pub value: String,
}

impl EffectiveFeatureValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_new_defaults() {
        let tenant = Tenant::new(TenantId::new(7), "acme", "Acme Corp");
        assert!(tenant.is_active);
        assert!(!tenant.is_deleted);
        assert_eq!(tenant.edition_id, None);

        let tenant = tenant.with_edition(EditionId::new(3));
        assert_eq!(tenant.edition_id, Some(EditionId::new(3)));
    }

    #[test]
    fn test_setting_key() {
        let setting = TenantFeatureSetting::new(TenantId::new(7), "Chat", "true");
        assert_eq!(setting.key(), "7/Chat");
    }

    #[test]
    fn test_setting_allows_empty_value() {
        let setting = TenantFeatureSetting::new(TenantId::new(1), "Banner", "");
        assert_eq!(setting.value, "");
    }
}
