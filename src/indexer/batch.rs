use futures::future::join_all;
use serde::Deserialize;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Group width and pause used when fanning out RPC calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchPolicy {
    pub concurrency: usize,
    pub delay_ms: u64,
}

impl BatchPolicy {
    pub const fn new(concurrency: usize, delay_ms: u64) -> Self {
        Self {
            concurrency,
            delay_ms,
        }
    }

    /// Chunked `eth_getLogs` queries.
    pub const fn log_queries() -> Self {
        Self::new(3, 100)
    }

    /// Per-block timestamp lookups.
    pub const fn timestamp_lookups() -> Self {
        Self::new(10, 50)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `fetch_one` over `items` in consecutive groups of `policy.concurrency`.
///
/// Calls inside a group run concurrently and the next group starts only once
/// the whole group has completed, with `policy.delay` of idle time between
/// groups. Results line up with `items` regardless of completion order.
/// The first failing item (by position) fails the whole run.
pub async fn run_batched<I, T, E, F, Fut>(
    items: &[I],
    policy: BatchPolicy,
    mut fetch_one: F,
) -> PipelineResult<Vec<T>>
where
    I: Debug,
    E: Display,
    F: FnMut(&I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let group_size = policy.concurrency.max(1);
    let mut results = Vec::with_capacity(items.len());

    for (group_index, group) in items.chunks(group_size).enumerate() {
        let outcomes = join_all(group.iter().map(&mut fetch_one)).await;

        for (offset, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => results.push(value),
                Err(e) => {
                    let index = group_index * group_size + offset;
                    return Err(PipelineError::BatchItem {
                        index,
                        item: format!("{:?}", group[offset]),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let processed = (group_index + 1) * group_size;
        if processed < items.len() && policy.delay_ms > 0 {
            tokio::time::sleep(policy.delay()).await;
        }
    }

    Ok(results)
}
