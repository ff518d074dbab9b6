use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::client::ChainLogClient;
use super::types::{BlockRange, LogQuery};
use crate::error::{PipelineError, PipelineResult};
use crate::wallet::{canonical, WalletSource};

#[derive(Default)]
pub struct FakeChainClient {
    pub current_block: u64,
    pub timestamps: HashMap<u64, u64>,
    pub failing_blocks: HashSet<u64>,
    pub logs: HashMap<(B256, Option<Address>), Vec<Log>>,
    pub failing_range: Option<BlockRange>,
    pub total_supply: U256,
    pub log_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub queried_ranges: Mutex<Vec<BlockRange>>,
}

impl FakeChainClient {
    pub fn with_block(current_block: u64) -> Self {
        Self {
            current_block,
            ..Default::default()
        }
    }

    pub fn add_logs(&mut self, signature: B256, from_filter: Option<Address>, logs: Vec<Log>) {
        self.logs
            .entry((signature, from_filter))
            .or_default()
            .extend(logs);
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainLogClient for FakeChainClient {
    async fn current_block_number(&self) -> eyre::Result<u64> {
        Ok(self.current_block)
    }

    async fn get_logs(&self, query: &LogQuery, range: BlockRange) -> eyre::Result<Vec<Log>> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.queried_ranges.lock().unwrap().push(range);

        if self.failing_range == Some(range) {
            return Err(eyre::eyre!("query returned more than 10000 results"));
        }

        let logs = self
            .logs
            .get(&(query.signature, query.from_filter))
            .map(|logs| {
                logs.iter()
                    .filter(|l| {
                        let n = l.block_number.unwrap_or_default();
                        n >= range.from && n <= range.to
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(logs)
    }

    async fn block_timestamp(&self, block_number: u64) -> eyre::Result<u64> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_blocks.contains(&block_number) {
            return Err(eyre::eyre!("header not found"));
        }
        self.timestamps
            .get(&block_number)
            .copied()
            .ok_or_else(|| eyre::eyre!("Block {} not found", block_number))
    }

    async fn read_u256(&self, _contract: Address, _selector: [u8; 4]) -> eyre::Result<U256> {
        Ok(self.total_supply)
    }
}

pub struct ScriptedWalletSource {
    pub wallets: Vec<String>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedWalletSource {
    pub fn new(wallets: &[Address]) -> Arc<Self> {
        Arc::new(Self {
            wallets: wallets.iter().map(canonical).collect(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSource for ScriptedWalletSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> PipelineResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::SourceFetch {
                url: "scripted".to_string(),
                reason: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        Ok(self.wallets.clone())
    }
}
