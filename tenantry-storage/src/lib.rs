//! Tenantry Storage - Store Traits, Transactions and Cache
//!
//! Defines the tenant feature store abstraction consumed by the resolution
//! engine and override writer, the transactional boundary they run in, and
//! the per-tenant feature cache. An in-memory implementation of each is
//! provided for tests and embedded use.

pub mod cache;
pub mod memory;
pub mod repository;
pub mod scope;
pub mod transaction;

pub use cache::{CacheStats, FeatureCache, InMemoryFeatureCache, TenantFeatureSnapshot};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use repository::{FeatureSettingRepository, TenantRepository};
pub use scope::TenantScope;
pub use transaction::{StoreTransaction, UnitOfWork};
