use alloy::primitives::U256;

use super::{movements, TokenMovement};
use crate::indexer::types::EventSnapshot;

pub const DAY_SECS: u64 = 86_400;

/// Events with `timestamp >= now - window_secs`.
pub fn count_since<'a, M, I>(events: I, now: u64, window_secs: u64) -> usize
where
    M: TokenMovement + ?Sized + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let cutoff = now.saturating_sub(window_secs);
    events
        .into_iter()
        .filter(|e| e.timestamp() >= cutoff)
        .count()
}

/// Headline numbers of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub active_wallets: usize,
    pub transfers_24h: usize,
    pub total_volume: U256,
    pub deposits: usize,
    pub circulating_supply: U256,
}

pub fn summarize(
    snapshot: &EventSnapshot,
    active_wallets: usize,
    circulating_supply: U256,
    now: u64,
) -> Summary {
    let moves = movements(snapshot);
    let total_volume = moves
        .iter()
        .fold(U256::ZERO, |acc, e| acc.saturating_add(e.amount()));

    Summary {
        active_wallets,
        transfers_24h: count_since(moves.iter().copied(), now, DAY_SECS),
        total_volume,
        deposits: snapshot.tokens_deposited.len(),
        circulating_supply,
    }
}
