use alloy::primitives::Address;
use std::collections::HashMap;

use super::TokenMovement;

pub const DEFAULT_TOP_WALLETS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletActivity {
    pub address: Address,
    /// Appearances as sender or recipient.
    pub count: usize,
}

/// Most active wallets by appearance count, highest first.
///
/// A self-transfer counts twice. Ties keep the order in which wallets were
/// first encountered.
pub fn top_wallets<'a, M, I>(events: I, limit: usize) -> Vec<WalletActivity>
where
    M: TokenMovement + ?Sized + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let mut ranking: Vec<WalletActivity> = Vec::new();
    let mut index: HashMap<Address, usize> = HashMap::new();

    let mut bump = |address: Address| {
        let slot = *index.entry(address).or_insert_with(|| {
            ranking.push(WalletActivity { address, count: 0 });
            ranking.len() - 1
        });
        ranking[slot].count += 1;
    };

    for event in events {
        bump(event.from());
        bump(event.to());
    }

    // Stable sort keeps first-encounter order among equal counts
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking.truncate(limit);
    ranking
}
