//! Feature cache invalidation.
//!
//! [`plan_invalidation`] maps an event to the work it requires without
//! touching any state. [`CacheInvalidator`] carries that plan out against
//! the store and cache, and [`spawn_invalidator`] drives it from the bus.

use crate::{EntityChange, EventBus, LifecycleEvent, WeakEventBus};
use chrono::Utc;
use std::sync::Arc;
use tenantry_core::{EditionId, TenantId, TenantryConfig, TenantryResult};
use tenantry_storage::{FeatureCache, StoreTransaction, TenantRepository, UnitOfWork};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Work required by one lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    /// Tenants whose cached snapshot must be evicted.
    pub evict: Vec<TenantId>,
    /// Edition whose tenants must have their edition reference cleared.
    pub detach_edition: Option<EditionId>,
}

impl InvalidationPlan {
    pub fn is_empty(&self) -> bool {
        self.evict.is_empty() && self.detach_edition.is_none()
    }
}

/// Compute the invalidation work for an event.
///
/// Deletions and transient tenants need nothing: there is no live snapshot
/// worth keeping consistent.
pub fn plan_invalidation(event: &LifecycleEvent) -> InvalidationPlan {
    match event {
        LifecycleEvent::TenantChanged {
            tenant_id: Some(tenant_id),
            change: EntityChange::Created | EntityChange::Updated,
        } => InvalidationPlan {
            evict: vec![*tenant_id],
            detach_edition: None,
        },
        LifecycleEvent::TenantChanged { .. } => InvalidationPlan::default(),
        LifecycleEvent::FeatureSettingsChanged { tenant_id } => InvalidationPlan {
            evict: vec![*tenant_id],
            detach_edition: None,
        },
        LifecycleEvent::EditionDeleted { edition_id } => InvalidationPlan {
            evict: Vec::new(),
            detach_edition: Some(*edition_id),
        },
    }
}

/// Applies invalidation plans to a store and cache.
pub struct CacheInvalidator<U: UnitOfWork> {
    store: Arc<U>,
    cache: Arc<dyn FeatureCache>,
    /// Republishes tenant updates caused by edition deletion. Must not keep
    /// the bus open.
    bus: Option<WeakEventBus>,
    evict_on_edition_delete: bool,
}

impl<U: UnitOfWork> CacheInvalidator<U> {
    pub fn new(store: Arc<U>, cache: Arc<dyn FeatureCache>, config: &TenantryConfig) -> Self {
        Self {
            store,
            cache,
            bus: None,
            evict_on_edition_delete: config.evict_on_edition_delete,
        }
    }

    /// Publish a `TenantChanged` event for every tenant detached from a
    /// deleted edition.
    ///
    /// Only a weak handle is kept; the bus closes when the caller's handles
    /// are dropped.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus.downgrade());
        self
    }

    pub fn cache(&self) -> &Arc<dyn FeatureCache> {
        &self.cache
    }

    /// Handle one event, returning the tenants whose snapshot was evicted.
    pub async fn handle(&self, event: &LifecycleEvent) -> TenantryResult<Vec<TenantId>> {
        let plan = plan_invalidation(event);
        if plan.is_empty() {
            debug!(event_type = event.event_type(), "Nothing to invalidate");
            return Ok(Vec::new());
        }

        let mut evict = plan.evict;
        if let Some(edition_id) = plan.detach_edition {
            let detached = self.detach_edition(edition_id).await?;
            if self.evict_on_edition_delete {
                evict.extend(detached.iter().copied());
            }
            if let Some(bus) = &self.bus {
                for tenant_id in &detached {
                    bus.publish(LifecycleEvent::tenant_changed(
                        *tenant_id,
                        EntityChange::Updated,
                    ));
                }
            }
        }

        let mut evicted = Vec::with_capacity(evict.len());
        for tenant_id in evict {
            if self.cache.remove(tenant_id).await? {
                debug!(tenant_id = %tenant_id, "Evicted tenant feature snapshot");
            }
            evicted.push(tenant_id);
        }
        Ok(evicted)
    }

    /// Clear the edition reference of every tenant on `edition_id`, in one
    /// transaction.
    async fn detach_edition(&self, edition_id: EditionId) -> TenantryResult<Vec<TenantId>> {
        let tx = self.store.begin().await?;
        let tenants = tx.tenant_list_by_edition(edition_id).await?;

        let mut detached = Vec::with_capacity(tenants.len());
        for mut tenant in tenants {
            tenant.edition_id = None;
            tenant.updated_at = Utc::now();
            tx.tenant_update(&tenant).await?;
            detached.push(tenant.tenant_id);
        }
        tx.commit().await?;

        info!(
            edition_id = %edition_id,
            tenants = detached.len(),
            "Detached tenants from deleted edition"
        );
        Ok(detached)
    }
}

/// Run an invalidator against a bus subscription until the bus closes.
///
/// The bus closes when every [`EventBus`] handle is dropped, including for
/// invalidators built with [`CacheInvalidator::with_bus`].
///
/// A lagged subscription cannot know which events it missed, so it clears
/// the whole cache.
pub fn spawn_invalidator<U>(
    invalidator: Arc<CacheInvalidator<U>>,
    mut rx: broadcast::Receiver<LifecycleEvent>,
) -> JoinHandle<()>
where
    U: UnitOfWork + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = invalidator.handle(&event).await {
                        error!(
                            event_type = event.event_type(),
                            error = %e,
                            "Cache invalidation failed"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Invalidator lagged behind event bus, clearing cache");
                    if let Err(e) = invalidator.cache().clear().await {
                        error!(error = %e, "Failed to clear feature cache");
                    }
                }
                Err(RecvError::Closed) => {
                    debug!("Event bus closed, stopping invalidator");
                    break;
                }
            }
        }
    })
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn change_strategy() -> impl Strategy<Value = EntityChange> {
        prop_oneof![
            Just(EntityChange::Created),
            Just(EntityChange::Updated),
            Just(EntityChange::Deleted),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: a tenant event only ever evicts that tenant's own key.
        #[test]
        fn prop_tenant_event_evicts_at_most_itself(
            id in any::<i32>(),
            change in change_strategy(),
        ) {
            let plan = plan_invalidation(&LifecycleEvent::tenant_changed(TenantId::new(id), change));
            prop_assert!(plan.evict.len() <= 1);
            prop_assert!(plan.evict.iter().all(|t| *t == TenantId::new(id)));
            prop_assert_eq!(plan.detach_edition, None);
            prop_assert_eq!(plan.evict.is_empty(), change == EntityChange::Deleted);
        }
    }
}
