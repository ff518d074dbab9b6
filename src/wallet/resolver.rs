use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::set::{parse_address, WalletSet};
use crate::error::{PipelineError, PipelineResult};

/// Body returned by the wallet listing endpoints.
#[derive(Debug, Deserialize)]
pub struct WalletsApiResponse {
    pub response: Vec<String>,
}

/// An upstream that lists tracked wallet addresses.
#[async_trait]
pub trait WalletSource: Send + Sync {
    /// Identifier used in logs and errors.
    fn name(&self) -> &str;

    async fn fetch(&self) -> PipelineResult<Vec<String>>;
}

/// Wallet source served over HTTP GET.
pub struct HttpWalletSource {
    url: String,
    client: reqwest::Client,
}

impl HttpWalletSource {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// One source per URL sharing a single connection pool.
    pub fn from_urls(urls: &[String]) -> PipelineResult<Vec<Arc<dyn WalletSource>>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(urls
            .iter()
            .map(|url| Arc::new(Self::new(url.clone(), client.clone())) as Arc<dyn WalletSource>)
            .collect())
    }

    fn fail(&self, reason: impl std::fmt::Display) -> PipelineError {
        PipelineError::SourceFetch {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl WalletSource for HttpWalletSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> PipelineResult<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.fail(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fail(format!("HTTP {}", status)));
        }

        let body: WalletsApiResponse = response.json().await.map_err(|e| self.fail(e))?;
        tracing::debug!(source = %self.url, wallets = body.response.len(), "Fetched wallet list");
        Ok(body.response)
    }
}

/// Fetch every source concurrently and merge into one canonical set.
///
/// Any failing source fails the whole resolution: a shrunken wallet universe
/// would silently skew every aggregate.
pub async fn resolve_wallets(sources: &[Arc<dyn WalletSource>]) -> PipelineResult<WalletSet> {
    if sources.is_empty() {
        return Err(PipelineError::Config(
            "No wallet sources configured".to_string(),
        ));
    }

    let lists = try_join_all(sources.iter().map(|s| s.fetch())).await?;

    let mut wallets = WalletSet::new();
    let mut total = 0usize;
    for (source, list) in sources.iter().zip(&lists) {
        for raw in list {
            total += 1;
            match parse_address(raw) {
                Some(address) => {
                    wallets.insert(address);
                }
                None => {
                    tracing::warn!(source = source.name(), value = %raw, "Skipping malformed wallet address");
                }
            }
        }
    }

    tracing::info!(total, unique = wallets.len(), "Resolved wallet set");
    Ok(wallets)
}
