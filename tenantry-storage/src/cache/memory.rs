//! In-memory feature cache.
//!
//! Uses tokio::sync::RwLock for safe async access.

use super::traits::{CacheStats, FeatureCache, TenantFeatureSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tenantry_core::{TenantId, TenantryResult};

/// In-memory [`FeatureCache`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryFeatureCache {
    entries: tokio::sync::RwLock<HashMap<TenantId, TenantFeatureSnapshot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryFeatureCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a snapshot is cached for the tenant, without touching stats.
    pub async fn contains(&self, tenant_id: TenantId) -> bool {
        self.entries.read().await.contains_key(&tenant_id)
    }
}

#[async_trait]
impl FeatureCache for InMemoryFeatureCache {
    async fn get(&self, tenant_id: TenantId) -> TenantryResult<Option<TenantFeatureSnapshot>> {
        let entries = self.entries.read().await;
        let snapshot = entries.get(&tenant_id).cloned();
        if snapshot.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(snapshot)
    }

    async fn put(&self, snapshot: TenantFeatureSnapshot) -> TenantryResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(snapshot.tenant_id, snapshot);
        Ok(())
    }

    async fn remove(&self, tenant_id: TenantId) -> TenantryResult<bool> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(&tenant_id).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    async fn clear(&self) -> TenantryResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        self.evictions.fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    async fn stats(&self) -> TenantryResult<CacheStats> {
        let entries = self.entries.read().await;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entries.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}
