use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tokens::units::to_display;

// ============================================================
// Query params
// ============================================================

#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    /// Decimal token amounts, inclusive.
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub page: Option<usize>,
}

// ============================================================
// Responses
// ============================================================

/// Snapshot-backed payload with its freshness.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse<T> {
    pub refreshed_at: DateTime<Utc>,
    /// A newer refresh failed; `data` is the last good snapshot.
    pub stale: bool,
    pub last_error: Option<String>,
    pub data: T,
}

/// Raw token units alongside the decimal-shifted value.
#[derive(Debug, Serialize)]
pub struct TokenAmount {
    pub raw: String,
    pub display: BigDecimal,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self {
            raw: raw.to_string(),
            display: to_display(raw, decimals),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub rpc_reachable: bool,
    pub current_block: Option<u64>,
    pub rpc_error: Option<String>,
    pub has_snapshot: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub contract_address: String,
    pub contract_url: Option<String>,
    pub proxy_address: String,
    pub proxy_url: Option<String>,
    pub token_decimals: u8,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub active_wallets: usize,
    pub transfers_24h: usize,
    pub total_volume: TokenAmount,
    pub deposits: usize,
    pub circulating_supply: TokenAmount,
}

#[derive(Debug, Serialize)]
pub struct VolumePoint {
    pub date: String,
    pub timestamp: u64,
    pub volume: TokenAmount,
}

#[derive(Debug, Serialize)]
pub struct CountPoint {
    pub date: String,
    pub timestamp: u64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TopWalletEntry {
    pub address: String,
    pub transaction_count: usize,
}

#[derive(Debug, Serialize)]
pub struct FeesResponse {
    pub psb_fee: TokenAmount,
    pub importa_fee: TokenAmount,
    pub fg_fee: TokenAmount,
    pub total: TokenAmount,
}

#[derive(Debug, Serialize)]
pub struct TransferTypeEntry {
    pub transfer_type: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TransactionEntry {
    pub kind: String,
    pub from: String,
    pub to: String,
    pub amount: TokenAmount,
    pub block_number: u64,
    pub transaction_hash: String,
    pub timestamp: u64,
    pub explorer_url: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionEntry>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
