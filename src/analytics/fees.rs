use alloy::primitives::U256;

use crate::indexer::types::{FeesCollectedEvent, TransferType};

/// Sums of each fee component across `FeesCollected` events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeTotals {
    pub psb: U256,
    pub importa: U256,
    pub fg: U256,
}

impl FeeTotals {
    pub fn total(&self) -> U256 {
        self.psb
            .saturating_add(self.importa)
            .saturating_add(self.fg)
    }
}

pub fn fee_totals(events: &[FeesCollectedEvent]) -> FeeTotals {
    events.iter().fold(FeeTotals::default(), |acc, e| FeeTotals {
        psb: acc.psb.saturating_add(e.psb_fee),
        importa: acc.importa.saturating_add(e.importa_fee),
        fg: acc.fg.saturating_add(e.fg_fee),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTypeCount {
    pub transfer_type: TransferType,
    pub count: usize,
}

/// Number of fee-bearing transfers per routing type. Types with no events
/// are omitted.
pub fn transfer_type_distribution(events: &[FeesCollectedEvent]) -> Vec<TransferTypeCount> {
    [TransferType::Internal, TransferType::External]
        .into_iter()
        .map(|transfer_type| TransferTypeCount {
            transfer_type,
            count: events
                .iter()
                .filter(|e| e.transfer_type == transfer_type)
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect()
}
