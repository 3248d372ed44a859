//! In-memory store with read-committed transactions.
//!
//! Committed rows live behind a shared lock. Each transaction buffers its
//! writes in a private overlay (with tombstones for deletions) and applies
//! the whole overlay under one write lock on commit. Concurrent commits to
//! the same row resolve as last writer wins.

use crate::{FeatureSettingRepository, StoreTransaction, TenantRepository, TenantScope, UnitOfWork};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tenantry_core::{
    EditionId, EntityType, StorageError, Tenant, TenantFeatureSetting, TenantId, TenantryResult,
};
use tracing::debug;

type SettingKey = (TenantId, String);

fn setting_key(tenant_id: TenantId, name: &str) -> SettingKey {
    (tenant_id, name.to_string())
}

#[derive(Debug, Default)]
struct StoreState {
    tenants: HashMap<TenantId, Tenant>,
    settings: BTreeMap<SettingKey, TenantFeatureSetting>,
    /// Feature names whose writes fail, for exercising rollback paths.
    rejected_features: HashSet<String>,
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory tenant and feature-setting store.
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TenantryResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> TenantryResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StorageError::LockPoisoned.into())
    }

    /// Clear all stored data.
    pub fn clear(&self) -> TenantryResult<()> {
        let mut state = self.write()?;
        state.tenants.clear();
        state.settings.clear();
        Ok(())
    }

    /// Get count of stored feature settings across all tenants.
    pub fn setting_count(&self) -> usize {
        self.read().map(|s| s.settings.len()).unwrap_or_default()
    }

    /// Get count of stored tenants, including soft-deleted ones.
    pub fn tenant_count(&self) -> usize {
        self.read().map(|s| s.tenants.len()).unwrap_or_default()
    }

    /// Make every insert or update of `name` fail with a storage error.
    pub fn reject_feature(&self, name: impl Into<String>) -> TenantryResult<()> {
        self.write()?.rejected_features.insert(name.into());
        Ok(())
    }

    fn transaction(&self) -> InMemoryTransaction {
        InMemoryTransaction {
            state: Arc::clone(&self.state),
            pending: Mutex::new(PendingWrites::default()),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> TenantryResult<InMemoryTransaction> {
        Ok(self.transaction())
    }
}

// Reads go straight to committed data; writes run in a single-operation
// transaction so they share the overlay's checks.

#[async_trait]
impl FeatureSettingRepository for InMemoryStore {
    async fn setting_find(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> TenantryResult<Option<TenantFeatureSetting>> {
        let state = self.read()?;
        Ok(state
            .settings
            .get(&setting_key(scope.tenant_id(), name))
            .cloned())
    }

    async fn setting_list(&self, scope: TenantScope) -> TenantryResult<Vec<TenantFeatureSetting>> {
        let state = self.read()?;
        Ok(state
            .settings
            .values()
            .filter(|s| scope.contains(s))
            .cloned()
            .collect())
    }

    async fn setting_insert(&self, setting: &TenantFeatureSetting) -> TenantryResult<()> {
        let tx = self.transaction();
        tx.setting_insert(setting).await?;
        tx.commit().await
    }

    async fn setting_update(&self, setting: &TenantFeatureSetting) -> TenantryResult<()> {
        let tx = self.transaction();
        tx.setting_update(setting).await?;
        tx.commit().await
    }

    async fn setting_delete(&self, scope: TenantScope, name: &str) -> TenantryResult<()> {
        let tx = self.transaction();
        tx.setting_delete(scope, name).await?;
        tx.commit().await
    }

    async fn setting_delete_all(&self, scope: TenantScope) -> TenantryResult<u64> {
        let tx = self.transaction();
        let removed = tx.setting_delete_all(scope).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl TenantRepository for InMemoryStore {
    async fn tenant_get(&self, id: TenantId) -> TenantryResult<Option<Tenant>> {
        let state = self.read()?;
        Ok(state.tenants.get(&id).filter(|t| !t.is_deleted).cloned())
    }

    async fn tenant_find_by_tenancy_name(
        &self,
        tenancy_name: &str,
    ) -> TenantryResult<Option<Tenant>> {
        self.transaction().tenant_find_by_tenancy_name(tenancy_name).await
    }

    async fn tenant_list_by_edition(&self, edition_id: EditionId) -> TenantryResult<Vec<Tenant>> {
        self.transaction().tenant_list_by_edition(edition_id).await
    }

    async fn tenant_insert(&self, tenant: &Tenant) -> TenantryResult<()> {
        let tx = self.transaction();
        tx.tenant_insert(tenant).await?;
        tx.commit().await
    }

    async fn tenant_update(&self, tenant: &Tenant) -> TenantryResult<()> {
        let tx = self.transaction();
        tx.tenant_update(tenant).await?;
        tx.commit().await
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Default)]
struct PendingWrites {
    tenants: HashMap<TenantId, Tenant>,
    /// `None` marks a deleted row.
    settings: BTreeMap<SettingKey, Option<TenantFeatureSetting>>,
}

impl PendingWrites {
    fn is_empty(&self) -> bool {
        self.tenants.is_empty() && self.settings.is_empty()
    }
}

/// Transaction over an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    state: Arc<RwLock<StoreState>>,
    pending: Mutex<PendingWrites>,
}

impl InMemoryTransaction {
    /// Run `f` against the committed state and this transaction's overlay.
    fn with_view<R>(
        &self,
        f: impl FnOnce(&StoreState, &mut PendingWrites) -> TenantryResult<R>,
    ) -> TenantryResult<R> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        f(&state, &mut pending)
    }

    fn visible_setting(
        state: &StoreState,
        pending: &PendingWrites,
        key: &SettingKey,
    ) -> Option<TenantFeatureSetting> {
        match pending.settings.get(key) {
            Some(entry) => entry.clone(),
            None => state.settings.get(key).cloned(),
        }
    }

    fn visible_settings(
        state: &StoreState,
        pending: &PendingWrites,
        scope: TenantScope,
    ) -> BTreeMap<String, TenantFeatureSetting> {
        let mut merged: BTreeMap<String, TenantFeatureSetting> = state
            .settings
            .values()
            .filter(|s| scope.contains(s))
            .map(|s| (s.name.clone(), s.clone()))
            .collect();

        for ((tenant_id, name), entry) in &pending.settings {
            if *tenant_id != scope.tenant_id() {
                continue;
            }
            match entry {
                Some(setting) => {
                    merged.insert(name.clone(), setting.clone());
                }
                None => {
                    merged.remove(name);
                }
            }
        }
        merged
    }

    fn visible_tenants(state: &StoreState, pending: &PendingWrites) -> Vec<Tenant> {
        let mut merged = state.tenants.clone();
        for (id, tenant) in &pending.tenants {
            merged.insert(*id, tenant.clone());
        }
        let mut tenants: Vec<Tenant> = merged.into_values().collect();
        tenants.sort_by_key(|t| t.tenant_id);
        tenants
    }

    fn check_writable(state: &StoreState, setting: &TenantFeatureSetting) -> TenantryResult<()> {
        if state.rejected_features.contains(&setting.name) {
            return Err(StorageError::UpdateFailed {
                entity_type: EntityType::TenantFeatureSetting,
                key: setting.key(),
                reason: "write rejected by store".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl FeatureSettingRepository for InMemoryTransaction {
    async fn setting_find(
        &self,
        scope: TenantScope,
        name: &str,
    ) -> TenantryResult<Option<TenantFeatureSetting>> {
        self.with_view(|state, pending| {
            Ok(Self::visible_setting(
                state,
                pending,
                &setting_key(scope.tenant_id(), name),
            ))
        })
    }

    async fn setting_list(&self, scope: TenantScope) -> TenantryResult<Vec<TenantFeatureSetting>> {
        self.with_view(|state, pending| {
            Ok(Self::visible_settings(state, pending, scope)
                .into_values()
                .collect())
        })
    }

    async fn setting_insert(&self, setting: &TenantFeatureSetting) -> TenantryResult<()> {
        self.with_view(|state, pending| {
            Self::check_writable(state, setting)?;
            let key = setting_key(setting.tenant_id, &setting.name);
            if Self::visible_setting(state, pending, &key).is_some() {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::TenantFeatureSetting,
                    reason: format!("{} already exists", setting.key()),
                }
                .into());
            }
            pending.settings.insert(key, Some(setting.clone()));
            Ok(())
        })
    }

    async fn setting_update(&self, setting: &TenantFeatureSetting) -> TenantryResult<()> {
        self.with_view(|state, pending| {
            Self::check_writable(state, setting)?;
            let key = setting_key(setting.tenant_id, &setting.name);
            if Self::visible_setting(state, pending, &key).is_none() {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::TenantFeatureSetting,
                    key: setting.key(),
                }
                .into());
            }
            pending.settings.insert(key, Some(setting.clone()));
            Ok(())
        })
    }

    async fn setting_delete(&self, scope: TenantScope, name: &str) -> TenantryResult<()> {
        self.with_view(|state, pending| {
            let key = setting_key(scope.tenant_id(), name);
            if Self::visible_setting(state, pending, &key).is_some() {
                pending.settings.insert(key, None);
            }
            Ok(())
        })
    }

    async fn setting_delete_all(&self, scope: TenantScope) -> TenantryResult<u64> {
        self.with_view(|state, pending| {
            let names: Vec<String> = Self::visible_settings(state, pending, scope)
                .into_keys()
                .collect();
            let removed = names.len() as u64;
            for name in names {
                pending
                    .settings
                    .insert(setting_key(scope.tenant_id(), &name), None);
            }
            Ok(removed)
        })
    }
}

#[async_trait]
impl TenantRepository for InMemoryTransaction {
    async fn tenant_get(&self, id: TenantId) -> TenantryResult<Option<Tenant>> {
        self.with_view(|state, pending| {
            Ok(pending
                .tenants
                .get(&id)
                .or_else(|| state.tenants.get(&id))
                .filter(|t| !t.is_deleted)
                .cloned())
        })
    }

    async fn tenant_find_by_tenancy_name(
        &self,
        tenancy_name: &str,
    ) -> TenantryResult<Option<Tenant>> {
        self.with_view(|state, pending| {
            Ok(Self::visible_tenants(state, pending)
                .into_iter()
                .find(|t| !t.is_deleted && t.tenancy_name.eq_ignore_ascii_case(tenancy_name)))
        })
    }

    async fn tenant_list_by_edition(&self, edition_id: EditionId) -> TenantryResult<Vec<Tenant>> {
        self.with_view(|state, pending| {
            Ok(Self::visible_tenants(state, pending)
                .into_iter()
                .filter(|t| !t.is_deleted && t.edition_id == Some(edition_id))
                .collect())
        })
    }

    async fn tenant_insert(&self, tenant: &Tenant) -> TenantryResult<()> {
        self.with_view(|state, pending| {
            let id = tenant.tenant_id;
            if pending.tenants.contains_key(&id) || state.tenants.contains_key(&id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::Tenant,
                    reason: format!("tenant {} already exists", id),
                }
                .into());
            }
            pending.tenants.insert(id, tenant.clone());
            Ok(())
        })
    }

    async fn tenant_update(&self, tenant: &Tenant) -> TenantryResult<()> {
        self.with_view(|state, pending| {
            let id = tenant.tenant_id;
            if !pending.tenants.contains_key(&id) && !state.tenants.contains_key(&id) {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Tenant,
                    key: id.to_string(),
                }
                .into());
            }
            pending.tenants.insert(id, tenant.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn commit(self) -> TenantryResult<()> {
        let pending = self
            .pending
            .into_inner()
            .map_err(|_| StorageError::LockPoisoned)?;
        if pending.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;
        let tenant_writes = pending.tenants.len();
        let setting_writes = pending.settings.len();

        for (id, tenant) in pending.tenants {
            state.tenants.insert(id, tenant);
        }
        for (key, entry) in pending.settings {
            match entry {
                Some(setting) => {
                    state.settings.insert(key, setting);
                }
                None => {
                    state.settings.remove(&key);
                }
            }
        }

        debug!(tenant_writes, setting_writes, "Committed in-memory transaction");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: uncommitted transactions never change committed state.
        #[test]
        fn prop_uncommitted_writes_invisible(
            names in proptest::collection::hash_set("[A-Z][a-z]{2,8}", 1..8)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemoryStore::new();
                let tx = store.begin().await.unwrap();
                for name in &names {
                    tx.setting_insert(&TenantFeatureSetting::new(TenantId::new(1), name, "v"))
                        .await
                        .unwrap();
                }
                drop(tx);
                assert_eq!(store.setting_count(), 0);
            });
        }

        /// Property: at most one row per (tenant, feature) after any insert sequence.
        #[test]
        fn prop_unique_per_tenant_feature(
            names in proptest::collection::vec("[A-C]", 1..20)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemoryStore::new();
                for name in &names {
                    let _ = store
                        .setting_insert(&TenantFeatureSetting::new(TenantId::new(1), name, "v"))
                        .await;
                }
                let distinct: std::collections::HashSet<&String> = names.iter().collect();
                assert_eq!(store.setting_count(), distinct.len());
            });
        }
    }
}
