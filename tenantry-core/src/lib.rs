//! Tenantry Core - Entity Types
//!
//! Pure data structures shared by every tenantry crate: identifiers,
//! entities, the error taxonomy and configuration. No storage or
//! resolution logic lives here.

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;
pub mod validation;

pub use config::{TenantryConfig, DEFAULT_EVENT_BUS_CAPACITY, DEFAULT_TENANCY_NAME_MAX_LENGTH};
pub use entities::{EffectiveFeatureValue, EntityType, FeatureDefinition, Tenant, TenantFeatureSetting};
pub use error::{
    ConfigError, StorageError, TenantError, TenantryError, TenantryResult, ValidationError,
};
pub use identity::{EditionId, TenantId, Timestamp};
pub use validation::{validate_tenancy_name, TENANCY_NAME_PATTERN};
