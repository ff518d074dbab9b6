use alloy::primitives::Address;

use super::batch::{run_batched, BatchPolicy};
use super::classifier::classify;
use super::client::ChainLogClient;
use super::decoder::decode_logs;
use super::partition::{partition, window_start};
use super::timestamps::resolve_timestamps;
use super::types::{BlockRange, EventKind, EventSnapshot, EventTaxonomy, RawLog, RawLogs};
use crate::error::{PipelineError, PipelineResult};
use crate::wallet::WalletSet;

/// Everything one fetch cycle needs besides the client and wallet set.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Contract emitting the events (the proxy).
    pub contract: Address,
    pub taxonomy: EventTaxonomy,
    pub blocks_per_day: u64,
    pub window_days: u64,
    pub max_block_span: u64,
    pub log_batch: BatchPolicy,
    pub timestamp_batch: BatchPolicy,
}

/// Run one complete fetch cycle: partition the trailing window, fetch each
/// event kind, resolve timestamps, classify against `wallets`.
///
/// Kinds are fetched one after another so that at most
/// `log_batch.concurrency` queries are in flight. Any unrecovered failure
/// discards the whole cycle.
pub async fn fetch_contract_events<C>(
    client: &C,
    settings: &FetchSettings,
    wallets: &WalletSet,
) -> PipelineResult<EventSnapshot>
where
    C: ChainLogClient + ?Sized,
{
    if wallets.is_empty() {
        tracing::info!("No wallets to track, skipping event fetch");
        return Ok(EventSnapshot::default());
    }

    let current_block = client
        .current_block_number()
        .await
        .map_err(|e| PipelineError::abort("block number", e))?;
    let from_block = window_start(current_block, settings.blocks_per_day, settings.window_days);
    let chunks = partition(from_block, current_block, settings.max_block_span)?;

    tracing::info!(
        wallets = wallets.len(),
        from = from_block,
        to = current_block,
        chunks = chunks.len(),
        taxonomy = settings.taxonomy.as_str(),
        "Fetching contract events"
    );

    let mut raw = RawLogs::default();
    for &kind in settings.taxonomy.kinds() {
        let logs = fetch_kind(client, settings, kind, &chunks).await?;
        tracing::debug!(kind = kind.as_str(), logs = logs.len(), "Fetched raw logs");
        *raw.bucket_mut(kind) = logs;
    }

    tracing::info!(
        transfers = raw.transfers.len(),
        meta_transfers = raw.meta_transfers.len(),
        fees_collected = raw.fees_collected.len(),
        tokens_burned = raw.tokens_burned.len(),
        deposits = raw.deposits.len(),
        "Raw logs fetched"
    );

    let timestamps = resolve_timestamps(
        client,
        raw.iter_all().map(|log| log.block_number),
        settings.timestamp_batch,
    )
    .await
    .map_err(|e| PipelineError::abort("timestamps", e))?;

    let snapshot = classify(&raw, wallets, &timestamps)?;

    tracing::info!(
        transfers = snapshot.transfers.len(),
        mints = snapshot.mints.len(),
        burns = snapshot.burns.len(),
        meta_transfers = snapshot.meta_transfers.len(),
        fees_collected = snapshot.fees_collected.len(),
        tokens_burned = snapshot.tokens_burned.len(),
        tokens_deposited = snapshot.tokens_deposited.len(),
        "Filtered events"
    );

    Ok(snapshot)
}

async fn fetch_kind<C>(
    client: &C,
    settings: &FetchSettings,
    kind: EventKind,
    chunks: &[BlockRange],
) -> PipelineResult<Vec<RawLog>>
where
    C: ChainLogClient + ?Sized,
{
    let query = kind.query(settings.contract);

    let per_chunk = run_batched(chunks, settings.log_batch, |range| {
        let range = *range;
        async move {
            let logs = client.get_logs(&query, range).await?;
            let decoded = decode_logs(kind, &logs)?;
            Ok::<_, eyre::Report>(decoded)
        }
    })
    .await
    .map_err(|e| PipelineError::abort(format!("{} logs", kind.as_str()), e))?;

    Ok(per_chunk.into_iter().flatten().collect())
}
