//! Feature cache trait and snapshot type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tenantry_core::{EditionId, TenantId, TenantryResult, Timestamp};

/// Cached, derived view of one tenant's feature state.
///
/// The authoritative data lives in the store; a snapshot is only valid until
/// the next eviction for its tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantFeatureSnapshot {
    pub tenant_id: TenantId,
    pub edition_id: Option<EditionId>,
    /// Explicit overrides, keyed by feature name.
    pub values: HashMap<String, String>,
    pub cached_at: Timestamp,
}

impl TenantFeatureSnapshot {
    pub fn new(tenant_id: TenantId, edition_id: Option<EditionId>) -> Self {
        Self {
            tenant_id,
            edition_id,
            values: HashMap::new(),
            cached_at: chrono::Utc::now(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

/// Per-tenant feature cache keyed by tenant ID.
///
/// The engine only ever evicts; population and expiry belong to whoever
/// owns the cache.
#[async_trait]
pub trait FeatureCache: Send + Sync {
    /// Get the cached snapshot for a tenant.
    async fn get(&self, tenant_id: TenantId) -> TenantryResult<Option<TenantFeatureSnapshot>>;

    /// Store a snapshot, replacing any existing one for the same tenant.
    async fn put(&self, snapshot: TenantFeatureSnapshot) -> TenantryResult<()>;

    /// Evict a tenant's snapshot. Returns whether an entry was present.
    async fn remove(&self, tenant_id: TenantId) -> TenantryResult<bool>;

    /// Evict every snapshot, returning how many were removed.
    async fn clear(&self) -> TenantryResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> TenantryResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries removed by eviction.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
