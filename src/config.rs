use alloy::primitives::Address;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::indexer::batch::BatchPolicy;
use crate::indexer::cycle::FetchSettings;
use crate::indexer::types::EventTaxonomy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub wallets: WalletsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RpcConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContractConfig {
    /// Implementation contract, shown for reference only.
    #[serde(default)]
    pub address: String,
    /// Proxy contract: events and `totalSupply` are read here.
    #[serde(default)]
    pub proxy_address: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            proxy_address: String::new(),
            token_decimals: default_token_decimals(),
            explorer_url: default_explorer_url(),
        }
    }
}

fn default_token_decimals() -> u8 {
    18
}

fn default_explorer_url() -> String {
    "https://hashscan.io/mainnet".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WalletsConfig {
    #[serde(default)]
    pub sources: Vec<String>,
}

// ============================================================
// Cache Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Age after which a snapshot is refetched.
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,
    /// How long an unused snapshot is retained.
    #[serde(default = "default_cache_time_ms")]
    pub cache_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: default_stale_time_ms(),
            cache_time_ms: default_cache_time_ms(),
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn cache_time(&self) -> Duration {
        Duration::from_millis(self.cache_time_ms)
    }
}

fn default_stale_time_ms() -> u64 {
    30_000
}

fn default_cache_time_ms() -> u64 {
    300_000
}

// ============================================================
// Indexer Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct IndexerConfig {
    #[serde(default = "default_blocks_per_day")]
    pub blocks_per_day: u64,
    #[serde(default = "default_window_days")]
    pub window_days: u64,
    #[serde(default = "default_max_block_span")]
    pub max_block_span: u64,
    #[serde(default)]
    pub taxonomy: EventTaxonomy,
    #[serde(default = "BatchPolicy::log_queries")]
    pub log_batch: BatchPolicy,
    #[serde(default = "BatchPolicy::timestamp_lookups")]
    pub timestamp_batch: BatchPolicy,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            blocks_per_day: default_blocks_per_day(),
            window_days: default_window_days(),
            max_block_span: default_max_block_span(),
            taxonomy: EventTaxonomy::default(),
            log_batch: BatchPolicy::log_queries(),
            timestamp_batch: BatchPolicy::timestamp_lookups(),
        }
    }
}

// ~3s blocks
fn default_blocks_per_day() -> u64 {
    28_800
}

fn default_window_days() -> u64 {
    30
}

fn default_max_block_span() -> u64 {
    9_999
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_api_port(),
            host: default_api_host(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid by environment variables only.
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values looked up through `lookup`. Unset and empty variables
    /// leave the current value in place.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> eyre::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("RPC_URL") {
            self.rpc.url = v;
        }
        if let Some(v) = var("CONTRACT_ADDRESS") {
            self.contract.address = v;
        }
        if let Some(v) = var("PROXY_ADDRESS") {
            self.contract.proxy_address = v;
        }
        if let Some(v) = var("TOKEN_DECIMALS") {
            self.contract.token_decimals = parse_env("TOKEN_DECIMALS", &v)?;
        }
        if let Some(v) = var("EXPLORER_URL") {
            self.contract.explorer_url = v;
        }
        if let Some(v) = var("WALLETS_API_URLS") {
            self.wallets.sources = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = var("QUERY_STALE_TIME_MS") {
            self.cache.stale_time_ms = parse_env("QUERY_STALE_TIME_MS", &v)?;
        }
        if let Some(v) = var("QUERY_CACHE_TIME_MS") {
            self.cache.cache_time_ms = parse_env("QUERY_CACHE_TIME_MS", &v)?;
        }
        if let Some(v) = var("BLOCKS_PER_DAY") {
            self.indexer.blocks_per_day = parse_env("BLOCKS_PER_DAY", &v)?;
        }
        if let Some(v) = var("EVENT_TAXONOMY") {
            self.indexer.taxonomy = match v.trim() {
                "meta_transfer" => EventTaxonomy::MetaTransfer,
                "transfer" => EventTaxonomy::Transfer,
                other => return Err(eyre::eyre!("Unknown EVENT_TAXONOMY '{}'", other)),
            };
        }
        if let Some(v) = var("API_HOST") {
            self.api.host = v;
        }
        if let Some(v) = var("API_PORT") {
            self.api.port = parse_env("API_PORT", &v)?;
        }
        Ok(())
    }

    /// Structural checks only. Missing RPC URL and proxy address are
    /// reported when the client or cycle is first built.
    fn validate(&self) -> eyre::Result<()> {
        if self.indexer.max_block_span == 0 {
            return Err(eyre::eyre!("indexer.max_block_span must be at least 1"));
        }
        if self.indexer.blocks_per_day == 0 {
            return Err(eyre::eyre!("indexer.blocks_per_day must be at least 1"));
        }
        if self.cache.stale_time_ms == 0 {
            return Err(eyre::eyre!("cache.stale_time_ms must be at least 1"));
        }
        for source in &self.wallets.sources {
            if !source.starts_with("http://") && !source.starts_with("https://") {
                return Err(eyre::eyre!("Invalid wallet source URL '{}'", source));
            }
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> PipelineResult<&str> {
        if self.rpc.url.trim().is_empty() {
            return Err(PipelineError::Config(
                "RPC URL is not configured (set RPC_URL)".to_string(),
            ));
        }
        Ok(&self.rpc.url)
    }

    pub fn proxy_address(&self) -> PipelineResult<Address> {
        let raw = self.contract.proxy_address.trim();
        if raw.is_empty() {
            return Err(PipelineError::Config(
                "Proxy address is not configured (set PROXY_ADDRESS)".to_string(),
            ));
        }
        Address::from_str(raw)
            .map_err(|e| PipelineError::Config(format!("Invalid proxy address '{}': {}", raw, e)))
    }

    pub fn fetch_settings(&self) -> PipelineResult<FetchSettings> {
        Ok(FetchSettings {
            contract: self.proxy_address()?,
            taxonomy: self.indexer.taxonomy,
            blocks_per_day: self.indexer.blocks_per_day,
            window_days: self.indexer.window_days,
            max_block_span: self.indexer.max_block_span,
            log_batch: self.indexer.log_batch,
            timestamp_batch: self.indexer.timestamp_batch,
        })
    }
}

fn parse_env<T>(key: &str, value: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| eyre::eyre!("Invalid value '{}' for {}: {}", value, key, e))
}
