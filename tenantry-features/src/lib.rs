//! Tenantry Features - Per-Tenant Feature Resolution
//!
//! Resolves the value a feature is in effect with for a tenant, and keeps
//! explicit tenant overrides minimal when values are written:
//!
//! ```text
//! ┌──────────────────┐  resolve   ┌──────────────────┐
//! │  FeatureManager  │ ─────────► │ FeatureResolver  │ ─► tenant override
//! │                  │            └──────────────────┘ ─► edition value
//! │                  │  write     ┌──────────────────┐ ─► catalog default
//! │                  │ ─────────► │  OverrideWriter  │ ─► FeatureSettingsChanged
//! │                  │            └──────────────────┘
//! │                  │  tenants   ┌──────────────────┐
//! │                  │ ─────────► │  TenantManager   │ ─► TenantChanged
//! └──────────────────┘            └──────────────────┘
//! ```
//!
//! Events go to an optional [`EventBus`](tenantry_events::EventBus), where a
//! cache invalidator evicts stale per-tenant snapshots.

mod blocking;
mod catalog;
mod edition;
mod manager;
mod resolution;
mod tenant;
mod writer;

pub use blocking::BlockingFeatureManager;
pub use catalog::{FeatureCatalog, StaticFeatureCatalog};
pub use edition::{EditionFeatureResolver, StaticEditionFeatures};
pub use manager::FeatureManager;
pub use resolution::{FeatureLayer, FeatureResolver, ResolvedFeatureValue};
pub use tenant::TenantManager;
pub use writer::{OverrideWriter, WriteOutcome};
