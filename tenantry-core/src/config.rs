//! Configuration types
//!
//! Configuration is loaded from environment variables with defaults that
//! suit development and tests.

use crate::{ConfigError, TenantryError, TenantryResult};

/// Default broadcast capacity of the lifecycle event bus.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Default maximum tenancy name length.
pub const DEFAULT_TENANCY_NAME_MAX_LENGTH: usize = 64;

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantryConfig {
    /// How many lifecycle events the bus buffers before slow subscribers lag.
    pub event_bus_capacity: usize,

    /// Maximum number of characters in a tenancy name.
    pub tenancy_name_max_length: usize,

    /// Evict each affected tenant's cache entry directly when an edition is
    /// deleted, instead of waiting for a tenant-changed signal.
    pub evict_on_edition_delete: bool,
}

impl Default for TenantryConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
            tenancy_name_max_length: DEFAULT_TENANCY_NAME_MAX_LENGTH,
            evict_on_edition_delete: true,
        }
    }
}

impl TenantryConfig {
    /// Create TenantryConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TENANTRY_EVENT_BUS_CAPACITY`: Event bus buffer size (default: 1024)
    /// - `TENANTRY_TENANCY_NAME_MAX_LENGTH`: Max tenancy name length (default: 64)
    /// - `TENANTRY_EVICT_ON_EDITION_DELETE`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let event_bus_capacity = std::env::var("TENANTRY_EVENT_BUS_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EVENT_BUS_CAPACITY);

        let tenancy_name_max_length = std::env::var("TENANTRY_TENANCY_NAME_MAX_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TENANCY_NAME_MAX_LENGTH);

        let evict_on_edition_delete = std::env::var("TENANTRY_EVICT_ON_EDITION_DELETE")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            event_bus_capacity,
            tenancy_name_max_length,
            evict_on_edition_delete,
        }
    }

    /// Set the event bus capacity.
    pub fn with_event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = capacity;
        self
    }

    /// Set the maximum tenancy name length.
    pub fn with_tenancy_name_max_length(mut self, max: usize) -> Self {
        self.tenancy_name_max_length = max;
        self
    }

    /// Enable or disable direct eviction on edition deletion.
    pub fn with_evict_on_edition_delete(mut self, enabled: bool) -> Self {
        self.evict_on_edition_delete = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TenantryResult<()> {
        if self.event_bus_capacity == 0 {
            return Err(TenantryError::Config(ConfigError::InvalidValue {
                field: "event_bus_capacity".to_string(),
                value: self.event_bus_capacity.to_string(),
                reason: "event_bus_capacity must be greater than 0".to_string(),
            }));
        }

        if self.tenancy_name_max_length < 2 {
            return Err(TenantryError::Config(ConfigError::InvalidValue {
                field: "tenancy_name_max_length".to_string(),
                value: self.tenancy_name_max_length.to_string(),
                reason: "tenancy_name_max_length must allow at least 2 characters".to_string(),
            }));
        }

        Ok(())
    }
}
