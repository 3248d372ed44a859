//! Edition default collaborator.
//!
//! Editions sit one level above tenants: an edition may override the catalog
//! default of any feature for every tenant assigned to it.

use async_trait::async_trait;
use std::collections::HashMap;
use tenantry_core::{EditionId, TenantryResult};
use tokio::sync::RwLock;

/// Source of edition-level feature values.
#[async_trait]
pub trait EditionFeatureResolver: Send + Sync {
    /// The value `edition_id` assigns to `name`, if it overrides it.
    async fn feature_value(
        &self,
        edition_id: EditionId,
        name: &str,
    ) -> TenantryResult<Option<String>>;
}

/// In-memory edition values, editable at runtime.
#[derive(Debug, Default)]
pub struct StaticEditionFeatures {
    values: RwLock<HashMap<(EditionId, String), String>>,
}

impl StaticEditionFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style value assignment.
    pub fn with_value(
        mut self,
        edition_id: EditionId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.values
            .get_mut()
            .insert((edition_id, name.into()), value.into());
        self
    }

    pub async fn set(
        &self,
        edition_id: EditionId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values
            .write()
            .await
            .insert((edition_id, name.into()), value.into());
    }

    pub async fn unset(&self, edition_id: EditionId, name: &str) -> bool {
        self.values
            .write()
            .await
            .remove(&(edition_id, name.to_string()))
            .is_some()
    }

    /// Forget every value of an edition.
    pub async fn remove_edition(&self, edition_id: EditionId) -> usize {
        let mut values = self.values.write().await;
        let before = values.len();
        values.retain(|(id, _), _| *id != edition_id);
        before - values.len()
    }
}

#[async_trait]
impl EditionFeatureResolver for StaticEditionFeatures {
    async fn feature_value(
        &self,
        edition_id: EditionId,
        name: &str,
    ) -> TenantryResult<Option<String>> {
        Ok(self
            .values
            .read()
            .await
            .get(&(edition_id, name.to_string()))
            .cloned())
    }
}
