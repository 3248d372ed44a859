//! Lifecycle event types.

use serde::{Deserialize, Serialize};
use tenantry_core::{EditionId, TenantId};

/// Kind of change applied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityChange {
    Created,
    Updated,
    Deleted,
}

/// Lifecycle signals that can leave derived feature state stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// A tenant was created, updated or deleted.
    ///
    /// `tenant_id` is `None` for a transient tenant that was never saved.
    TenantChanged {
        tenant_id: Option<TenantId>,
        change: EntityChange,
    },

    /// An edition was removed; its tenants must lose their edition reference.
    EditionDeleted { edition_id: EditionId },

    /// Explicit feature overrides of a tenant were inserted, updated or removed.
    FeatureSettingsChanged { tenant_id: TenantId },
}

impl LifecycleEvent {
    /// Tenant change for a persisted tenant.
    pub fn tenant_changed(tenant_id: TenantId, change: EntityChange) -> Self {
        Self::TenantChanged {
            tenant_id: Some(tenant_id),
            change,
        }
    }

    /// Short name used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TenantChanged {
                change: EntityChange::Created,
                ..
            } => "TenantCreated",
            Self::TenantChanged {
                change: EntityChange::Updated,
                ..
            } => "TenantUpdated",
            Self::TenantChanged {
                change: EntityChange::Deleted,
                ..
            } => "TenantDeleted",
            Self::EditionDeleted { .. } => "EditionDeleted",
            Self::FeatureSettingsChanged { .. } => "FeatureSettingsChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let created = LifecycleEvent::tenant_changed(TenantId::new(1), EntityChange::Created);
        assert_eq!(created.event_type(), "TenantCreated");

        let deleted = LifecycleEvent::EditionDeleted {
            edition_id: EditionId::new(3),
        };
        assert_eq!(deleted.event_type(), "EditionDeleted");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = LifecycleEvent::FeatureSettingsChanged {
            tenant_id: TenantId::new(7),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FeatureSettingsChanged");
        assert_eq!(json["tenant_id"], 7);
    }
}
