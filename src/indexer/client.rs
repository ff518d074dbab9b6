use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log, TransactionRequest};
use async_trait::async_trait;

use super::types::{BlockRange, LogQuery};

/// Read-only chain access used by the event pipeline.
///
/// Implementations are constructed once and passed into every component, so
/// tests can substitute a scripted client.
#[async_trait]
pub trait ChainLogClient: Send + Sync {
    async fn current_block_number(&self) -> eyre::Result<u64>;

    /// Logs matching `query` inside `range`. The caller keeps `range` within
    /// the upstream span limit.
    async fn get_logs(&self, query: &LogQuery, range: BlockRange) -> eyre::Result<Vec<Log>>;

    /// Unix timestamp of a block. May fail per call.
    async fn block_timestamp(&self, block_number: u64) -> eyre::Result<u64>;

    /// Call a zero-argument view function returning a single `uint256`.
    async fn read_u256(&self, contract: Address, selector: [u8; 4]) -> eyre::Result<U256>;
}

/// `ChainLogClient` backed by an alloy HTTP provider.
pub struct AlloyChainClient<P> {
    provider: P,
}

impl<P: Provider> AlloyChainClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

/// Build a client for an HTTP JSON-RPC endpoint.
pub fn connect_http(rpc_url: &str) -> eyre::Result<AlloyChainClient<impl Provider>> {
    let url = rpc_url
        .parse()
        .map_err(|e| eyre::eyre!("Invalid RPC URL '{}': {}", rpc_url, e))?;
    let provider = ProviderBuilder::new().connect_http(url);
    Ok(AlloyChainClient::new(provider))
}

#[async_trait]
impl<P: Provider + Send + Sync> ChainLogClient for AlloyChainClient<P> {
    async fn current_block_number(&self) -> eyre::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn get_logs(&self, query: &LogQuery, range: BlockRange) -> eyre::Result<Vec<Log>> {
        let mut filter = Filter::new()
            .address(query.contract)
            .event_signature(query.signature)
            .from_block(range.from)
            .to_block(range.to);

        if let Some(from) = query.from_filter {
            filter = filter.topic1(from.into_word());
        }

        let logs = self.provider.get_logs(&filter).await?;
        tracing::debug!(
            from = range.from,
            to = range.to,
            logs = logs.len(),
            "Fetched log chunk"
        );
        Ok(logs)
    }

    async fn block_timestamp(&self, block_number: u64) -> eyre::Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await?
            .ok_or_else(|| eyre::eyre!("Block {} not found", block_number))?;
        Ok(block.header.timestamp)
    }

    async fn read_u256(&self, contract: Address, selector: [u8; 4]) -> eyre::Result<U256> {
        let tx = TransactionRequest::default()
            .to(contract)
            .input(Bytes::copy_from_slice(&selector).into());
        let output = self.provider.call(tx).await?;

        if output.len() < 32 {
            return Err(eyre::eyre!(
                "Short return data from {}: {} bytes",
                contract,
                output.len()
            ));
        }
        Ok(U256::from_be_slice(&output[..32]))
    }
}
