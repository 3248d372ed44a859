//! Tenantry Events - Lifecycle Events and Cache Invalidation
//!
//! Tenant, edition and feature-setting changes are published as
//! [`LifecycleEvent`]s on an [`EventBus`]. The [`CacheInvalidator`]
//! subscribes to the bus and evicts stale per-tenant feature snapshots.
//!
//! # Architecture
//!
//! ```text
//! writers ──publish──> EventBus ──subscribe──> spawn_invalidator
//!                                                  │
//!                                   plan_invalidation(event)
//!                                                  │
//!                              detach edition (tx) + FeatureCache::remove
//! ```

mod bus;
mod event;
mod invalidation;

pub use bus::{EventBus, WeakEventBus};
pub use event::{EntityChange, LifecycleEvent};
pub use invalidation::{plan_invalidation, spawn_invalidator, CacheInvalidator, InvalidationPlan};
