use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

use super::types::{EventKind, LogQuery, RawLog, RawLogArgs};
use crate::error::{PipelineError, PipelineResult};

// Event and view-function ABI of the tNGN token (proxy) contract.
sol! {
    struct BurnMetadata {
        string destinationBankCode;
        string destinationName;
        string destinationBankAccountNumber;
        string senderAccountNumber;
        string narration;
        string senderName;
        string fromLocation;
        uint256 txAmount;
    }

    event Transfer(address indexed from, address indexed to, uint256 value);

    event MetaTransferExecuted(
        address indexed from,
        address indexed to,
        uint256 amount,
        bool isPlatformTransfer,
        address indexed relayer,
        uint256 nonce
    );

    event FeesCollected(
        address indexed from,
        address indexed to,
        uint256 amount,
        uint256 psbFee,
        uint256 importaFee,
        uint256 fgFee,
        uint8 transferType
    );

    event TokensBurned(
        address indexed from,
        uint256 amount,
        address indexed burner,
        BurnMetadata metadata
    );

    function totalSupply() external view returns (uint256);
}

/// Selector of `totalSupply()`.
pub const TOTAL_SUPPLY_SELECTOR: [u8; 4] = totalSupplyCall::SELECTOR;

impl EventKind {
    /// topic0 of the event this kind queries.
    pub fn signature(&self) -> B256 {
        match self {
            Self::Transfer | Self::Deposit => Transfer::SIGNATURE_HASH,
            Self::MetaTransferExecuted => MetaTransferExecuted::SIGNATURE_HASH,
            Self::FeesCollected => FeesCollected::SIGNATURE_HASH,
            Self::TokensBurned => TokensBurned::SIGNATURE_HASH,
        }
    }

    /// Build the `eth_getLogs` query for this kind against `contract`.
    pub fn query(&self, contract: Address) -> LogQuery {
        let from_filter = match self {
            Self::Deposit => Some(Address::ZERO),
            _ => None,
        };
        LogQuery {
            contract,
            signature: self.signature(),
            from_filter,
        }
    }
}

/// Decode a log returned by the query for `kind`.
///
/// Fails if topic0 does not match, if the ABI payload is malformed, or if the
/// log is missing its block number or transaction hash (pending logs).
pub fn decode_log(kind: EventKind, log: &Log) -> PipelineResult<RawLog> {
    let err = |reason: String| PipelineError::Decode {
        kind: kind.as_str(),
        reason,
    };

    let topics = log.inner.data.topics();
    if topics.first() != Some(&kind.signature()) {
        return Err(err(format!("unexpected topic0 {:?}", topics.first())));
    }

    let block_number = log
        .block_number
        .ok_or_else(|| err("log has no block number".to_string()))?;
    let transaction_hash = log
        .transaction_hash
        .ok_or_else(|| err("log has no transaction hash".to_string()))?;

    let args = match kind {
        EventKind::Transfer | EventKind::Deposit => {
            let decoded = Transfer::decode_log(&log.inner).map_err(|e| err(e.to_string()))?;
            RawLogArgs::Transfer {
                from: decoded.from,
                to: decoded.to,
                value: decoded.value,
            }
        }
        EventKind::MetaTransferExecuted => {
            let decoded =
                MetaTransferExecuted::decode_log(&log.inner).map_err(|e| err(e.to_string()))?;
            RawLogArgs::MetaTransferExecuted {
                from: decoded.from,
                to: decoded.to,
                amount: decoded.amount,
                is_platform_transfer: decoded.isPlatformTransfer,
                relayer: decoded.relayer,
                nonce: decoded.nonce,
            }
        }
        EventKind::FeesCollected => {
            let decoded = FeesCollected::decode_log(&log.inner).map_err(|e| err(e.to_string()))?;
            RawLogArgs::FeesCollected {
                from: decoded.from,
                to: decoded.to,
                amount: decoded.amount,
                psb_fee: decoded.psbFee,
                importa_fee: decoded.importaFee,
                fg_fee: decoded.fgFee,
                transfer_type: decoded.transferType,
            }
        }
        EventKind::TokensBurned => {
            let decoded = TokensBurned::decode_log(&log.inner).map_err(|e| err(e.to_string()))?;
            let m = &decoded.metadata;
            RawLogArgs::TokensBurned {
                from: decoded.from,
                amount: decoded.amount,
                burner: decoded.burner,
                metadata: super::types::BurnMetadata {
                    destination_bank_code: m.destinationBankCode.clone(),
                    destination_name: m.destinationName.clone(),
                    destination_bank_account_number: m.destinationBankAccountNumber.clone(),
                    sender_account_number: m.senderAccountNumber.clone(),
                    narration: m.narration.clone(),
                    sender_name: m.senderName.clone(),
                    from_location: m.fromLocation.clone(),
                    tx_amount: m.txAmount,
                },
            }
        }
    };

    Ok(RawLog {
        block_number,
        transaction_hash,
        args,
    })
}

/// Decode every log of a chunk, failing on the first malformed one.
pub fn decode_logs(kind: EventKind, logs: &[Log]) -> PipelineResult<Vec<RawLog>> {
    logs.iter().map(|log| decode_log(kind, log)).collect()
}
