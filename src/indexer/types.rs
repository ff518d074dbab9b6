use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;

/// Inclusive block range queried in a single `eth_getLogs` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    /// Number of blocks covered.
    pub fn span(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Which event vocabulary a deployment reads from the contract.
/// The two overlap on raw `Transfer` data, so only one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTaxonomy {
    #[default]
    MetaTransfer,
    Transfer,
}

impl EventTaxonomy {
    /// Event kinds fetched for this taxonomy, in fetch order.
    pub fn kinds(&self) -> &'static [EventKind] {
        match self {
            Self::MetaTransfer => &[
                EventKind::MetaTransferExecuted,
                EventKind::FeesCollected,
                EventKind::TokensBurned,
                EventKind::Deposit,
            ],
            Self::Transfer => &[
                EventKind::Transfer,
                EventKind::FeesCollected,
                EventKind::TokensBurned,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaTransfer => "meta_transfer",
            Self::Transfer => "transfer",
        }
    }
}

/// A contract event query, one per fetched kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Every `Transfer`, split into mint / burn / transfer.
    Transfer,
    MetaTransferExecuted,
    FeesCollected,
    TokensBurned,
    /// `Transfer` filtered at query time to `from == address(0)`.
    Deposit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "Transfer",
            Self::MetaTransferExecuted => "MetaTransferExecuted",
            Self::FeesCollected => "FeesCollected",
            Self::TokensBurned => "TokensBurned",
            Self::Deposit => "Transfer(mint)",
        }
    }
}

/// Parameters for one `eth_getLogs` query, minus the block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub contract: Address,
    pub signature: B256,
    /// Filter on the first indexed argument (`from` for all kinds we read).
    pub from_filter: Option<Address>,
}

/// Burn details attached to a `TokensBurned` event. Opaque to aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BurnMetadata {
    pub destination_bank_code: String,
    pub destination_name: String,
    pub destination_bank_account_number: String,
    pub sender_account_number: String,
    pub narration: String,
    pub sender_name: String,
    pub from_location: String,
    pub tx_amount: U256,
}

/// Decoded event arguments of a raw log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLogArgs {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    MetaTransferExecuted {
        from: Address,
        to: Address,
        amount: U256,
        is_platform_transfer: bool,
        relayer: Address,
        nonce: U256,
    },
    FeesCollected {
        from: Address,
        to: Address,
        amount: U256,
        psb_fee: U256,
        importa_fee: U256,
        fg_fee: U256,
        transfer_type: u8,
    },
    TokensBurned {
        from: Address,
        amount: U256,
        burner: Address,
        metadata: BurnMetadata,
    },
}

impl RawLogArgs {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::MetaTransferExecuted { .. } => "MetaTransferExecuted",
            Self::FeesCollected { .. } => "FeesCollected",
            Self::TokensBurned { .. } => "TokensBurned",
        }
    }
}

/// One on-chain event occurrence as fetched, before wallet filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub block_number: u64,
    pub transaction_hash: B256,
    pub args: RawLogArgs,
}

/// Raw logs of one fetch cycle, bucketed by the query that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogs {
    pub transfers: Vec<RawLog>,
    pub meta_transfers: Vec<RawLog>,
    pub fees_collected: Vec<RawLog>,
    pub tokens_burned: Vec<RawLog>,
    pub deposits: Vec<RawLog>,
}

impl RawLogs {
    pub fn bucket_mut(&mut self, kind: EventKind) -> &mut Vec<RawLog> {
        match kind {
            EventKind::Transfer => &mut self.transfers,
            EventKind::MetaTransferExecuted => &mut self.meta_transfers,
            EventKind::FeesCollected => &mut self.fees_collected,
            EventKind::TokensBurned => &mut self.tokens_burned,
            EventKind::Deposit => &mut self.deposits,
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &RawLog> {
        self.transfers
            .iter()
            .chain(&self.meta_transfers)
            .chain(&self.fees_collected)
            .chain(&self.tokens_burned)
            .chain(&self.deposits)
    }

    pub fn len(&self) -> usize {
        self.iter_all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fee routing recorded on `FeesCollected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferType {
    /// Wallet to wallet inside the platform.
    Internal,
    /// Platform wallet to an external account.
    External,
}

impl TryFrom<u8> for TransferType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::External),
            other => Err(other),
        }
    }
}

impl TransferType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Internal => "Importa Internal",
            Self::External => "Importa to External",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    pub to: Address,
    pub amount: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnEvent {
    pub from: Address,
    pub amount: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensBurnedEvent {
    pub from: Address,
    pub amount: U256,
    pub burner: Address,
    pub metadata: BurnMetadata,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

/// Relayed (gasless) transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub is_platform_transfer: bool,
    pub relayer: Address,
    pub nonce: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesCollectedEvent {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub psb_fee: U256,
    pub importa_fee: U256,
    pub fg_fee: U256,
    pub transfer_type: TransferType,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensDepositedEvent {
    pub to: Address,
    pub amount: U256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub timestamp: u64,
}

/// Typed events of one completed fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSnapshot {
    pub transfers: Vec<TransferEvent>,
    pub mints: Vec<MintEvent>,
    pub burns: Vec<BurnEvent>,
    pub meta_transfers: Vec<MetaTransferEvent>,
    pub fees_collected: Vec<FeesCollectedEvent>,
    pub tokens_burned: Vec<TokensBurnedEvent>,
    pub tokens_deposited: Vec<TokensDepositedEvent>,
}

impl EventSnapshot {
    pub fn total_events(&self) -> usize {
        self.transfers.len()
            + self.mints.len()
            + self.burns.len()
            + self.meta_transfers.len()
            + self.fees_collected.len()
            + self.tokens_burned.len()
            + self.tokens_deposited.len()
    }
}
