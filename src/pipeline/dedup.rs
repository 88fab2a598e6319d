use std::collections::HashSet;

use crate::error::LookupError;
use crate::records::TradeRecord;
use crate::storage::StorageBackend;

/// Drop trades whose id is already stored, plus repeats of an id within `candidates`.
///
/// Issues exactly one lookup for a non-empty batch and none for an empty one.
/// Survivors keep their input order.
pub async fn filter_unseen<S: StorageBackend>(
    store: &S,
    candidates: Vec<TradeRecord>,
) -> Result<Vec<TradeRecord>, LookupError> {
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let ids: Vec<i64> = candidates.iter().map(|trade| trade.id).collect();
    let existing = store
        .lookup_existing_ids(&ids)
        .await
        .map_err(|source| LookupError {
            candidates: ids.len(),
            source,
        })?;

    let mut seen = HashSet::with_capacity(candidates.len());
    Ok(candidates
        .into_iter()
        .filter(|trade| !existing.contains(&trade.id) && seen.insert(trade.id))
        .collect())
}
