use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;

use super::batch::{run_batched, BatchPolicy};
use super::client::ChainLogClient;
use crate::error::{PipelineError, PipelineResult};

/// Resolve each distinct block number to its unix timestamp.
///
/// A failed lookup is logged and recorded as `0` rather than failing the
/// cycle, so the returned map always holds every requested block. A run of
/// zeros in a report therefore points at an RPC outage, not at genesis.
pub async fn resolve_timestamps<C, I>(
    client: &C,
    block_numbers: I,
    policy: BatchPolicy,
) -> PipelineResult<HashMap<u64, u64>>
where
    C: ChainLogClient + ?Sized,
    I: IntoIterator<Item = u64>,
{
    let unique: Vec<u64> = block_numbers
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    tracing::debug!(blocks = unique.len(), "Resolving block timestamps");

    let resolved = run_batched(&unique, policy, |block: &u64| {
        let block = *block;
        async move {
            let timestamp = match client.block_timestamp(block).await {
                Ok(ts) => ts,
                Err(e) => {
                    let failure = PipelineError::TimestampLookup {
                        block,
                        reason: e.to_string(),
                    };
                    tracing::warn!(block, error = %failure, "Defaulting block timestamp to 0");
                    0
                }
            };
            Ok::<_, Infallible>((block, timestamp))
        }
    })
    .await?;

    let failed = resolved.iter().filter(|(_, ts)| *ts == 0).count();
    if failed > 0 {
        tracing::warn!(failed, total = resolved.len(), "Some block timestamps unresolved");
    }

    Ok(resolved.into_iter().collect())
}
