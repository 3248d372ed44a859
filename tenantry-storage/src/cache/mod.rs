//! Per-tenant feature cache.
//!
//! The cache holds a derived [`TenantFeatureSnapshot`] per tenant. It is
//! keyed by tenant ID alone, so eviction is always a point removal of one
//! tenant's entry. Keeping it consistent with the store is the job of the
//! invalidator in `tenantry-events`.

pub mod memory;
pub mod traits;

pub use memory::InMemoryFeatureCache;
pub use traits::{CacheStats, FeatureCache, TenantFeatureSnapshot};
