use alloy::primitives::Address;
use std::collections::HashMap;

use super::types::{
    BurnEvent, EventSnapshot, FeesCollectedEvent, MetaTransferEvent, MintEvent, RawLog,
    RawLogArgs, RawLogs, TokensBurnedEvent, TokensDepositedEvent, TransferEvent, TransferType,
};
use crate::error::{PipelineError, PipelineResult};
use crate::wallet::WalletSet;

/// Filter raw logs to the tracked wallets and turn them into typed events.
///
/// | bucket          | kept when                 | produces                     |
/// |-----------------|---------------------------|------------------------------|
/// | transfers       | from or to tracked        | mint / burn / transfer       |
/// | meta_transfers  | from or to tracked        | `MetaTransferEvent`          |
/// | fees_collected  | from or to tracked        | `FeesCollectedEvent`         |
/// | tokens_burned   | from tracked              | `TokensBurnedEvent`          |
/// | deposits        | to tracked                | `TokensDepositedEvent`       |
///
/// Timestamps missing from `timestamps` default to 0. Output keeps input
/// order. A log whose arguments do not belong to its bucket, or an unknown
/// fee transfer type, aborts the cycle.
pub fn classify(
    raw: &RawLogs,
    wallets: &WalletSet,
    timestamps: &HashMap<u64, u64>,
) -> PipelineResult<EventSnapshot> {
    let ts = |log: &RawLog| timestamps.get(&log.block_number).copied().unwrap_or(0);
    let tracked = |address: &Address| wallets.contains(address);

    let mut snapshot = EventSnapshot::default();

    for log in &raw.transfers {
        let RawLogArgs::Transfer { from, to, value } = &log.args else {
            return Err(misplaced("transfers", log));
        };
        if !(tracked(from) || tracked(to)) {
            continue;
        }

        if from.is_zero() {
            snapshot.mints.push(MintEvent {
                to: *to,
                amount: *value,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash,
                timestamp: ts(log),
            });
        } else if to.is_zero() {
            snapshot.burns.push(BurnEvent {
                from: *from,
                amount: *value,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash,
                timestamp: ts(log),
            });
        } else {
            snapshot.transfers.push(TransferEvent {
                from: *from,
                to: *to,
                amount: *value,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash,
                timestamp: ts(log),
            });
        }
    }

    for log in &raw.meta_transfers {
        let RawLogArgs::MetaTransferExecuted {
            from,
            to,
            amount,
            is_platform_transfer,
            relayer,
            nonce,
        } = &log.args
        else {
            return Err(misplaced("meta_transfers", log));
        };
        if !(tracked(from) || tracked(to)) {
            continue;
        }

        snapshot.meta_transfers.push(MetaTransferEvent {
            from: *from,
            to: *to,
            amount: *amount,
            is_platform_transfer: *is_platform_transfer,
            relayer: *relayer,
            nonce: *nonce,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            timestamp: ts(log),
        });
    }

    for log in &raw.fees_collected {
        let RawLogArgs::FeesCollected {
            from,
            to,
            amount,
            psb_fee,
            importa_fee,
            fg_fee,
            transfer_type,
        } = &log.args
        else {
            return Err(misplaced("fees_collected", log));
        };
        if !(tracked(from) || tracked(to)) {
            continue;
        }

        let transfer_type = TransferType::try_from(*transfer_type).map_err(|value| {
            PipelineError::Unclassifiable(format!(
                "unknown transfer type {} in tx {}",
                value, log.transaction_hash
            ))
        })?;

        snapshot.fees_collected.push(FeesCollectedEvent {
            from: *from,
            to: *to,
            amount: *amount,
            psb_fee: *psb_fee,
            importa_fee: *importa_fee,
            fg_fee: *fg_fee,
            transfer_type,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            timestamp: ts(log),
        });
    }

    for log in &raw.tokens_burned {
        let RawLogArgs::TokensBurned {
            from,
            amount,
            burner,
            metadata,
        } = &log.args
        else {
            return Err(misplaced("tokens_burned", log));
        };
        if !tracked(from) {
            continue;
        }

        snapshot.tokens_burned.push(TokensBurnedEvent {
            from: *from,
            amount: *amount,
            burner: *burner,
            metadata: metadata.clone(),
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            timestamp: ts(log),
        });
    }

    for log in &raw.deposits {
        let RawLogArgs::Transfer { from, to, value } = &log.args else {
            return Err(misplaced("deposits", log));
        };
        if !from.is_zero() {
            return Err(PipelineError::Unclassifiable(format!(
                "deposit log in tx {} has non-zero sender",
                log.transaction_hash
            )));
        }
        if !tracked(to) {
            continue;
        }

        snapshot.tokens_deposited.push(TokensDepositedEvent {
            to: *to,
            amount: *value,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            timestamp: ts(log),
        });
    }

    Ok(snapshot)
}

fn misplaced(bucket: &str, log: &RawLog) -> PipelineError {
    PipelineError::Unclassifiable(format!(
        "{} log in tx {} placed in {} bucket",
        log.args.name(),
        log.transaction_hash,
        bucket
    ))
}
