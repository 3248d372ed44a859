//! Error types for tenantry operations

use crate::{EntityType, TenantId};
use thiserror::Error;

/// Storage layer errors.
///
/// These come from the backing store and pass through the engine unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with key {key}")]
    NotFound { entity_type: EntityType, key: String },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with key {key}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        key: String,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Tenant lookup and uniqueness errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantError {
    #[error("There is no tenant with id: {tenant_id}")]
    NotFound { tenant_id: TenantId },

    #[error("Tenancy name {tenancy_name} is already taken")]
    DuplicateTenancyName { tenancy_name: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid tenancy name {tenancy_name}: {reason}")]
    InvalidTenancyName { tenancy_name: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all tenantry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Tenant error: {0}")]
    Tenant(#[from] TenantError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Runtime error: {reason}")]
    Runtime { reason: String },
}

impl TenantryError {
    /// Shorthand for the user-facing "tenant does not exist" failure.
    pub fn tenant_not_found(tenant_id: TenantId) -> Self {
        TenantError::NotFound { tenant_id }.into()
    }

    /// Whether this error is a user-facing failure detected before any write.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Tenant(_) | Self::Validation(_))
    }
}

/// Result type alias for tenantry operations.
pub type TenantryResult<T> = Result<T, TenantryError>;

// =============================================================================
// TESTS
// =============================================================================
