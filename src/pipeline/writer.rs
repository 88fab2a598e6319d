use log::warn;

use crate::error::WriteError;
use crate::records::Record;
use crate::storage::{BatchTransaction, StorageBackend};

/// Write `records` in one transaction and return how many rows the store kept.
///
/// Any failed append rolls the batch back, so either every record lands or none does.
/// An empty slice never opens a transaction.
pub async fn write_all<S, T>(store: &S, records: &[T]) -> Result<u64, WriteError>
where
    S: StorageBackend,
    T: Record,
{
    if records.is_empty() {
        return Ok(0);
    }

    let table = T::TABLE;
    let mut batch = store
        .begin_batch(table)
        .await
        .map_err(|source| WriteError::Begin { table, source })?;

    let mut kept = 0;
    for (index, record) in records.iter().enumerate() {
        let appended = batch.append(record.row()).await;
        match appended {
            Ok(rows) => kept += rows,
            Err(source) => {
                if let Err(err) = batch.rollback().await {
                    warn!("{table}: rollback after failed append also failed: {err}");
                }
                return Err(WriteError::Append {
                    table,
                    index,
                    source,
                });
            }
        }
    }

    batch
        .commit()
        .await
        .map_err(|source| WriteError::Commit { table, source })?;

    Ok(kept)
}
