pub mod fees;
pub mod metrics;
pub mod ranking;
pub mod series;
pub mod table;

use alloy::primitives::{Address, U256};

use crate::indexer::types::{EventSnapshot, MetaTransferEvent, TransferEvent};

pub use fees::{fee_totals, transfer_type_distribution, FeeTotals, TransferTypeCount};
pub use metrics::{count_since, summarize, Summary, DAY_SECS};
pub use ranking::{top_wallets, WalletActivity, DEFAULT_TOP_WALLETS};
pub use series::{daily_series, DailyBucket};
pub use table::{paginate, transaction_rows, AmountRange, Page, TransactionKind, TransactionRow};

/// A wallet-to-wallet token movement.
pub trait TokenMovement {
    fn from(&self) -> Address;
    fn to(&self) -> Address;
    fn amount(&self) -> U256;
    fn timestamp(&self) -> u64;
}

impl TokenMovement for TransferEvent {
    fn from(&self) -> Address {
        self.from
    }

    fn to(&self) -> Address {
        self.to
    }

    fn amount(&self) -> U256 {
        self.amount
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TokenMovement for MetaTransferEvent {
    fn from(&self) -> Address {
        self.from
    }

    fn to(&self) -> Address {
        self.to
    }

    fn amount(&self) -> U256 {
        self.amount
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Every movement in the snapshot: plain transfers, then meta transfers.
/// Only one of the two is populated for a given taxonomy.
pub fn movements(snapshot: &EventSnapshot) -> Vec<&dyn TokenMovement> {
    snapshot
        .transfers
        .iter()
        .map(|e| e as &dyn TokenMovement)
        .chain(snapshot.meta_transfers.iter().map(|e| e as &dyn TokenMovement))
        .collect()
}
