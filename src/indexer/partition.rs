use crate::error::{PipelineError, PipelineResult};
use crate::indexer::types::BlockRange;

/// Split `[from_block, to_block]` into ascending, gap-free ranges of at most
/// `max_span` blocks each.
pub fn partition(from_block: u64, to_block: u64, max_span: u64) -> PipelineResult<Vec<BlockRange>> {
    if from_block > to_block || max_span < 1 {
        return Err(PipelineError::InvalidRange {
            from: from_block,
            to: to_block,
            max_span,
        });
    }

    let total = to_block - from_block + 1;
    let mut ranges = Vec::with_capacity(total.div_ceil(max_span) as usize);
    let mut start = from_block;

    loop {
        // `max_span - 1` keeps the block count at `max_span` without overflowing near u64::MAX
        let end = start.saturating_add(max_span - 1).min(to_block);
        ranges.push(BlockRange { from: start, to: end });
        if end == to_block {
            break;
        }
        start = end + 1;
    }

    Ok(ranges)
}

/// First block of the trailing window ending at `current_block`, clamped at genesis.
pub fn window_start(current_block: u64, blocks_per_day: u64, window_days: u64) -> u64 {
    current_block.saturating_sub(blocks_per_day.saturating_mul(window_days))
}
