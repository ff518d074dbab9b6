use alloy::primitives::{Address, B256, U256};

use crate::error::PipelineResult;
use crate::indexer::types::EventSnapshot;
use crate::tokens::units::parse_amount;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Internal,
    External,
    Deposit,
    Transfer,
    Burn,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::External => "External",
            Self::Deposit => "Deposit",
            Self::Transfer => "Transfer",
            Self::Burn => "Burn",
        }
    }
}

/// One line of the transaction table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub kind: TransactionKind,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

/// All table rows of a snapshot, newest block first.
pub fn transaction_rows(snapshot: &EventSnapshot) -> Vec<TransactionRow> {
    let mut rows = Vec::with_capacity(
        snapshot.meta_transfers.len()
            + snapshot.tokens_deposited.len()
            + snapshot.transfers.len()
            + snapshot.mints.len()
            + snapshot.burns.len(),
    );

    rows.extend(snapshot.meta_transfers.iter().map(|e| TransactionRow {
        kind: if e.is_platform_transfer {
            TransactionKind::Internal
        } else {
            TransactionKind::External
        },
        from: e.from,
        to: e.to,
        amount: e.amount,
        block_number: e.block_number,
        transaction_hash: e.transaction_hash,
        timestamp: e.timestamp,
    }));
    rows.extend(snapshot.tokens_deposited.iter().map(|e| TransactionRow {
        kind: TransactionKind::Deposit,
        from: Address::ZERO,
        to: e.to,
        amount: e.amount,
        block_number: e.block_number,
        transaction_hash: e.transaction_hash,
        timestamp: e.timestamp,
    }));
    rows.extend(snapshot.transfers.iter().map(|e| TransactionRow {
        kind: TransactionKind::Transfer,
        from: e.from,
        to: e.to,
        amount: e.amount,
        block_number: e.block_number,
        transaction_hash: e.transaction_hash,
        timestamp: e.timestamp,
    }));
    rows.extend(snapshot.mints.iter().map(|e| TransactionRow {
        kind: TransactionKind::Deposit,
        from: Address::ZERO,
        to: e.to,
        amount: e.amount,
        block_number: e.block_number,
        transaction_hash: e.transaction_hash,
        timestamp: e.timestamp,
    }));
    rows.extend(snapshot.burns.iter().map(|e| TransactionRow {
        kind: TransactionKind::Burn,
        from: e.from,
        to: Address::ZERO,
        amount: e.amount,
        block_number: e.block_number,
        transaction_hash: e.transaction_hash,
        timestamp: e.timestamp,
    }));

    rows.sort_by(|a, b| b.block_number.cmp(&a.block_number));
    rows
}

/// Inclusive bounds on the raw amount. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmountRange {
    pub min: Option<U256>,
    pub max: Option<U256>,
}

impl AmountRange {
    /// Build from user-entered decimal strings. Blank input means no bound.
    pub fn parse(min: Option<&str>, max: Option<&str>, decimals: u8) -> PipelineResult<Self> {
        let bound = |text: Option<&str>| -> PipelineResult<Option<U256>> {
            match text.map(str::trim).filter(|t| !t.is_empty()) {
                Some(t) => parse_amount(t, decimals).map(Some),
                None => Ok(None),
            }
        };
        Ok(Self {
            min: bound(min)?,
            max: bound(max)?,
        })
    }

    pub fn contains(&self, amount: U256) -> bool {
        self.min.map_or(true, |min| amount >= min) && self.max.map_or(true, |max| amount <= max)
    }

    pub fn filter(&self, rows: Vec<TransactionRow>) -> Vec<TransactionRow> {
        rows.into_iter().filter(|r| self.contains(r.amount)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice out one 1-based page of `PAGE_SIZE` rows. Pages outside
/// `1..=total_pages` are empty.
pub fn paginate<T: Clone>(rows: &[T], page: usize) -> Page<T> {
    let total_items = rows.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE);

    let items = if page == 0 {
        Vec::new()
    } else {
        rows.iter()
            .skip((page - 1).saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .cloned()
            .collect()
    };

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::meta;
    use crate::indexer::types::{BurnEvent, MintEvent, TokensDepositedEvent};

    fn wallet() -> Address {
        Address::repeat_byte(0xab)
    }

    #[test]
    fn test_rows_sorted_newest_first_and_stable() {
        let mut external = meta(wallet(), wallet(), 3, 5, 0);
        external.is_platform_transfer = false;
        let snapshot = EventSnapshot {
            meta_transfers: vec![meta(wallet(), wallet(), 1, 5, 0), meta(wallet(), wallet(), 2, 9, 0), external],
            tokens_deposited: vec![TokensDepositedEvent {
                to: wallet(),
                amount: U256::from(4),
                block_number: 7,
                transaction_hash: B256::ZERO,
                timestamp: 0,
            }],
            ..Default::default()
        };

        let rows = transaction_rows(&snapshot);
        let summary: Vec<(u64, u64, TransactionKind)> = rows
            .iter()
            .map(|r| (r.block_number, r.amount.to::<u64>(), r.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                (9, 2, TransactionKind::Internal),
                (7, 4, TransactionKind::Deposit),
                (5, 1, TransactionKind::Internal),
                (5, 3, TransactionKind::External),
            ]
        );
        assert_eq!(rows[1].from, Address::ZERO);
    }

    #[test]
    fn test_transfer_taxonomy_rows() {
        let snapshot = EventSnapshot {
            mints: vec![MintEvent {
                to: wallet(),
                amount: U256::from(10),
                block_number: 1,
                transaction_hash: B256::ZERO,
                timestamp: 0,
            }],
            burns: vec![BurnEvent {
                from: wallet(),
                amount: U256::from(3),
                block_number: 2,
                transaction_hash: B256::ZERO,
                timestamp: 0,
            }],
            ..Default::default()
        };

        let rows = transaction_rows(&snapshot);
        assert_eq!(rows[0].kind, TransactionKind::Burn);
        assert_eq!(rows[0].to, Address::ZERO);
        assert_eq!(rows[1].kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_amount_range_scales_user_input() {
        let range = AmountRange::parse(Some("1.5"), Some(""), 2).unwrap();
        assert_eq!(range.min, Some(U256::from(150)));
        assert_eq!(range.max, None);

        assert!(!range.contains(U256::from(149)));
        assert!(range.contains(U256::from(150)));
        assert!(range.contains(U256::MAX));

        let closed = AmountRange::parse(Some("1"), Some("2"), 0).unwrap();
        let rows: Vec<_> = (0..4u64)
            .map(|amount| TransactionRow {
                kind: TransactionKind::Internal,
                from: wallet(),
                to: wallet(),
                amount: U256::from(amount),
                block_number: amount,
                transaction_hash: B256::ZERO,
                timestamp: 0,
            })
            .collect();
        let kept: Vec<u64> = closed.filter(rows).iter().map(|r| r.block_number).collect();
        assert_eq!(kept, vec![1, 2]);

        assert!(AmountRange::parse(Some("abc"), None, 18).is_err());
    }

    #[test]
    fn test_paginate() {
        let rows: Vec<u32> = (0..23).collect();

        let first = paginate(&rows, 1);
        assert_eq!(first.items, (0..10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 23);

        assert_eq!(paginate(&rows, 3).items, vec![20, 21, 22]);
        assert!(paginate(&rows, 4).items.is_empty());
        assert!(paginate(&rows, 0).items.is_empty());

        let empty: Vec<u32> = vec![];
        assert_eq!(paginate(&empty, 1).total_pages, 0);
    }
}
