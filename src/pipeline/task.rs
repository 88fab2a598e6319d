use crate::error::TaskError;
use crate::fetch::MarketDataSource;
use crate::records::{FetchTarget, Snapshot, SnapshotKind};
use crate::storage::StorageBackend;

use super::dedup::filter_unseen;
use super::writer::write_all;
use super::PipelineContext;

/// One market's share of a cycle: fetch, drop already-stored trades, write the rest.
/// Returns the number of rows the store kept.
pub async fn run_task<C, S>(
    ctx: &PipelineContext<C, S>,
    target: &FetchTarget,
    kind: SnapshotKind,
) -> Result<u64, TaskError>
where
    C: MarketDataSource,
    S: StorageBackend,
{
    let snapshot = ctx.source.fetch(target, kind).await?;
    let store = ctx.store.as_ref();

    let written = match snapshot {
        Snapshot::Ticker(ticker) => write_all(store, std::slice::from_ref(&ticker)).await?,
        Snapshot::OrderBook(book) => {
            let rows = book.rows();
            write_all(store, &rows).await?
        }
        Snapshot::TradeHistory(trades) => {
            let fresh = filter_unseen(store, trades).await?;
            write_all(store, &fresh).await?
        }
        Snapshot::MarketSummaries(summaries) => write_all(store, &summaries).await?,
    };

    Ok(written)
}
