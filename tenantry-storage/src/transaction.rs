//! Transactional boundary.
//!
//! A [`UnitOfWork`] hands out [`StoreTransaction`]s. Reads inside a
//! transaction see committed data plus the transaction's own writes; nothing
//! becomes visible to others until [`StoreTransaction::commit`]. Dropping a
//! transaction without committing discards its writes.

use crate::{FeatureSettingRepository, TenantRepository};
use async_trait::async_trait;
use tenantry_core::TenantryResult;

/// An open, all-or-nothing unit of reads and writes.
#[async_trait]
pub trait StoreTransaction: TenantRepository + FeatureSettingRepository {
    /// Apply every write made through this transaction atomically.
    async fn commit(self) -> TenantryResult<()>;
}

/// Transaction provider.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Transaction: StoreTransaction + 'static;

    /// Open a new transaction.
    async fn begin(&self) -> TenantryResult<Self::Transaction>;
}
