use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::records::{Row, Table};

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgStore;

/// Relational store the pipeline writes into.
///
/// Shared by every task of every pipeline, so implementations must tolerate
/// concurrent transactions.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    type Batch: BatchTransaction;

    /// Open a transaction that will only receive rows for `table`.
    async fn begin_batch(&self, table: Table) -> Result<Self::Batch, BoxError>;

    /// Return the subset of `ids` already present in the trade history table.
    async fn lookup_existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>, BoxError>;
}

/// One open all-or-nothing write.
#[async_trait]
pub trait BatchTransaction: Send + Sized {
    /// Insert one row and return how many rows the store actually kept: 0 when a
    /// trade with the same id is already present.
    async fn append(&mut self, row: Row<'_>) -> Result<u64, BoxError>;

    async fn commit(self) -> Result<(), BoxError>;

    async fn rollback(self) -> Result<(), BoxError>;
}
