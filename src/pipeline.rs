use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::indexer::client::ChainLogClient;
use crate::indexer::cycle::{fetch_contract_events, FetchSettings};
use crate::indexer::decoder::TOTAL_SUPPLY_SELECTOR;
use crate::indexer::types::EventSnapshot;
use crate::retry::{retry_if, retry_with_backoff, RetryPolicy};
use crate::wallet::{resolve_wallets, WalletSet, WalletSource};

/// Chain handle plus the cycle settings that go with it.
pub struct ChainAccess {
    pub client: Arc<dyn ChainLogClient>,
    pub settings: FetchSettings,
}

/// One published, internally consistent view of the contract.
#[derive(Debug)]
pub struct Snapshot {
    pub events: Arc<EventSnapshot>,
    pub wallets: Arc<WalletSet>,
    pub total_supply: U256,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub snapshot: Option<Arc<Snapshot>>,
    /// Error of the most recent refresh, cleared on success.
    pub last_error: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// The published snapshot predates a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_some() && self.last_error.is_some()
    }
}

// ============================================================
// Snapshot cache
// ============================================================

struct CacheEntry {
    events: Arc<EventSnapshot>,
    fetched_at: Instant,
    last_used: Instant,
}

/// Event snapshots keyed by wallet-set fingerprint.
pub struct SnapshotCache {
    entries: HashMap<u64, CacheEntry>,
    stale_time: Duration,
    cache_time: Duration,
}

impl SnapshotCache {
    pub fn new(stale_time: Duration, cache_time: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_time,
            cache_time,
        }
    }

    /// Entry for `key` if younger than the stale time.
    pub fn fresh(&mut self, key: u64, now: Instant) -> Option<Arc<EventSnapshot>> {
        self.evict(now);
        let entry = self.entries.get_mut(&key)?;
        if now.duration_since(entry.fetched_at) >= self.stale_time {
            return None;
        }
        entry.last_used = now;
        Some(entry.events.clone())
    }

    pub fn insert(&mut self, key: u64, events: Arc<EventSnapshot>, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                events,
                fetched_at: now,
                last_used: now,
            },
        );
        self.evict(now);
    }

    /// Drop entries unused for longer than the cache time.
    pub fn evict(&mut self, now: Instant) {
        let cache_time = self.cache_time;
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_used) <= cache_time);
    }

    pub fn remove(&mut self, key: u64) {
        self.entries.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct CachedWallets {
    wallets: Arc<WalletSet>,
    fetched_at: Instant,
}

// ============================================================
// Dashboard
// ============================================================

/// Owns the refresh cycle and the published snapshot.
///
/// Readers always see the last good snapshot. A failed refresh records its
/// error next to it instead of replacing it.
pub struct Dashboard {
    chain: Result<ChainAccess, String>,
    sources: Vec<Arc<dyn WalletSource>>,
    stale_time: Duration,
    state: RwLock<DashboardState>,
    cache: Mutex<SnapshotCache>,
    wallets: Mutex<Option<CachedWallets>>,
    refresh_lock: Mutex<()>,
    manual: Notify,
}

impl Dashboard {
    /// `chain` may carry a setup error; it is reported on every refresh
    /// rather than at construction.
    pub fn new(
        chain: PipelineResult<ChainAccess>,
        sources: Vec<Arc<dyn WalletSource>>,
        stale_time: Duration,
        cache_time: Duration,
    ) -> Self {
        Self {
            chain: chain.map_err(|e| match e {
                PipelineError::Config(reason) => reason,
                other => other.to_string(),
            }),
            sources,
            stale_time,
            state: RwLock::new(DashboardState::default()),
            cache: Mutex::new(SnapshotCache::new(stale_time, cache_time)),
            wallets: Mutex::new(None),
            refresh_lock: Mutex::new(()),
            manual: Notify::new(),
        }
    }

    pub fn from_config(
        config: &Config,
        chain: PipelineResult<ChainAccess>,
        sources: Vec<Arc<dyn WalletSource>>,
    ) -> Self {
        Self::new(
            chain,
            sources,
            config.cache.stale_time(),
            config.cache.cache_time(),
        )
    }

    pub fn client(&self) -> Option<&Arc<dyn ChainLogClient>> {
        self.chain.as_ref().ok().map(|c| &c.client)
    }

    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.read().await.snapshot.clone()
    }

    /// Ask the refresh loop for an immediate cycle that bypasses the caches.
    pub fn request_refresh(&self) {
        self.manual.notify_one();
    }

    /// Run one refresh and publish the outcome. With `force`, cached wallets
    /// and events are refetched.
    pub async fn refresh(&self, force: bool) -> PipelineResult<Arc<Snapshot>> {
        let _guard = self.refresh_lock.lock().await;
        let started = Utc::now();

        let outcome = self.build_snapshot(force).await;

        let mut state = self.state.write().await;
        state.last_attempt = Some(started);
        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                tracing::info!(
                    wallets = snapshot.wallets.len(),
                    events = snapshot.events.total_events(),
                    "Snapshot published"
                );
                state.snapshot = Some(snapshot.clone());
                state.last_error = None;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!(error = %e, has_snapshot = state.snapshot.is_some(), "Refresh failed");
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn build_snapshot(&self, force: bool) -> PipelineResult<Snapshot> {
        let chain = self
            .chain
            .as_ref()
            .map_err(|reason| PipelineError::Config(reason.clone()))?;

        let wallets = self.current_wallets(force).await?;
        let key = wallets.fingerprint();

        let cached = {
            let mut cache = self.cache.lock().await;
            if force {
                cache.remove(key);
            }
            cache.fresh(key, Instant::now())
        };

        let events = match cached {
            Some(events) => {
                tracing::debug!(fingerprint = key, "Reusing cached events");
                events
            }
            None => {
                let events = retry_if(
                    RetryPolicy::event_cycle(),
                    "event fetch",
                    PipelineError::is_transient,
                    || fetch_contract_events(chain.client.as_ref(), &chain.settings, &wallets),
                )
                .await?;
                let events = Arc::new(events);
                self.cache
                    .lock()
                    .await
                    .insert(key, events.clone(), Instant::now());
                events
            }
        };

        let total_supply = retry_with_backoff(RetryPolicy::total_supply(), "total supply", || {
            chain
                .client
                .read_u256(chain.settings.contract, TOTAL_SUPPLY_SELECTOR)
        })
        .await
        .map_err(|e| PipelineError::abort("total supply", e))?;

        Ok(Snapshot {
            events,
            wallets,
            total_supply,
            refreshed_at: Utc::now(),
        })
    }

    async fn current_wallets(&self, force: bool) -> PipelineResult<Arc<WalletSet>> {
        let mut cached = self.wallets.lock().await;
        if let Some(entry) = cached.as_ref() {
            if !force && entry.fetched_at.elapsed() < self.stale_time {
                return Ok(entry.wallets.clone());
            }
        }

        let wallets = retry_if(
            RetryPolicy::wallets(),
            "wallet resolution",
            PipelineError::is_transient,
            || resolve_wallets(&self.sources),
        )
        .await?;

        let wallets = Arc::new(wallets);
        *cached = Some(CachedWallets {
            wallets: wallets.clone(),
            fetched_at: Instant::now(),
        });
        Ok(wallets)
    }

    /// Refresh on start, then whenever the stale time elapses or a manual
    /// refresh is requested, until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut force = false;
        loop {
            // Failures are recorded in the state by `refresh`
            let _ = self.refresh(force).await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Refresh loop shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.stale_time) => {
                    force = false;
                }
                _ = self.manual.notified() => {
                    tracing::info!("Manual refresh requested");
                    force = true;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::indexer::batch::BatchPolicy;
    use crate::indexer::decoder::tests::{fees_collected_log, meta_transfer_log, TOKEN};
    use crate::indexer::testing::{FakeChainClient, ScriptedWalletSource};
    use crate::indexer::types::{EventKind, EventTaxonomy};
    use alloy::primitives::{address, Address};
    use std::sync::atomic::Ordering;

    const W1: Address = address!("0x1000000000000000000000000000000000000001");
    const W2: Address = address!("0x2000000000000000000000000000000000000002");

    pub(crate) fn chain() -> (Arc<FakeChainClient>, ChainAccess) {
        chain_with(|_| {})
    }

    fn chain_with(extra: impl FnOnce(&mut FakeChainClient)) -> (Arc<FakeChainClient>, ChainAccess) {
        let mut client = FakeChainClient::with_block(100);
        for b in 0..=100 {
            client.timestamps.insert(b, 1_700_000_000 + b);
        }
        client.total_supply = U256::from(1_000_000);
        client.add_logs(
            EventKind::MetaTransferExecuted.signature(),
            None,
            vec![meta_transfer_log(W1, W2, 5, true, 90)],
        );
        extra(&mut client);

        let client = Arc::new(client);
        let access = ChainAccess {
            client: client.clone(),
            settings: FetchSettings {
                contract: TOKEN,
                taxonomy: EventTaxonomy::MetaTransfer,
                blocks_per_day: 10,
                window_days: 3,
                max_block_span: 10,
                log_batch: BatchPolicy::new(3, 0),
                timestamp_batch: BatchPolicy::new(10, 0),
            },
        };
        (client, access)
    }

    fn dashboard(access: PipelineResult<ChainAccess>, source: Arc<ScriptedWalletSource>) -> Dashboard {
        Dashboard::new(
            access,
            vec![source as Arc<dyn WalletSource>],
            Duration::from_secs(30),
            Duration::from_secs(300),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_snapshot() {
        let (client, access) = chain();
        let dashboard = dashboard(Ok(access), ScriptedWalletSource::new(&[W1, W2]));

        assert!(dashboard.snapshot().await.is_none());
        let snapshot = dashboard.refresh(false).await.unwrap();

        assert_eq!(snapshot.wallets.len(), 2);
        assert_eq!(snapshot.events.meta_transfers.len(), 1);
        assert_eq!(snapshot.total_supply, U256::from(1_000_000));
        assert!(client.log_calls() > 0);

        let state = dashboard.state().await;
        assert!(state.snapshot.is_some());
        assert!(state.last_error.is_none());
        assert!(!state.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_skips_refetch() {
        let (client, access) = chain();
        let source = ScriptedWalletSource::new(&[W1]);
        let dashboard = dashboard(Ok(access), source.clone());

        dashboard.refresh(false).await.unwrap();
        let log_calls = client.log_calls();
        dashboard.refresh(false).await.unwrap();

        assert_eq!(client.log_calls(), log_calls);
        assert_eq!(source.calls(), 1);

        // Forced refresh bypasses both caches
        dashboard.refresh(true).await.unwrap();
        assert_eq!(client.log_calls(), log_calls * 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entries_are_refetched() {
        let (client, access) = chain();
        let dashboard = dashboard(Ok(access), ScriptedWalletSource::new(&[W1]));

        dashboard.refresh(false).await.unwrap();
        let log_calls = client.log_calls();

        tokio::time::advance(Duration::from_secs(31)).await;
        dashboard.refresh(false).await.unwrap();
        assert_eq!(client.log_calls(), log_calls * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_last_snapshot() {
        let (_client, access) = chain();
        let source = ScriptedWalletSource::new(&[W1]);
        let dashboard = dashboard(Ok(access), source.clone());

        let first = dashboard.refresh(false).await.unwrap();

        source.fail.store(true, Ordering::SeqCst);
        let err = dashboard.refresh(true).await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceFetch { .. }));
        // Initial call plus three retries
        assert_eq!(source.calls(), 1 + 4);

        let state = dashboard.state().await;
        let kept = state.snapshot.clone().unwrap();
        assert!(Arc::ptr_eq(&kept, &first));
        assert!(state.last_error.unwrap().contains("503"));

        let state = dashboard.state().await;
        assert!(state.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassifiable_log_is_not_retried() {
        let (healthy, access) = chain();
        dashboard(Ok(access), ScriptedWalletSource::new(&[W1]))
            .refresh(false)
            .await
            .unwrap();
        let one_cycle = healthy.log_calls();

        let (client, access) = chain_with(|client| {
            client.add_logs(
                EventKind::FeesCollected.signature(),
                None,
                vec![fees_collected_log(W1, W2, 7, 95)],
            );
        });
        let dashboard = dashboard(Ok(access), ScriptedWalletSource::new(&[W1]));
        let start = Instant::now();

        let err = dashboard.refresh(false).await.unwrap_err();
        assert!(matches!(err, PipelineError::Unclassifiable(_)));
        assert_eq!(client.log_calls(), one_cycle);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_error_surfaces_on_refresh() {
        let dashboard = dashboard(
            Err(PipelineError::Config("RPC URL is not configured".to_string())),
            ScriptedWalletSource::new(&[W1]),
        );

        let err = dashboard.refresh(false).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(dashboard.client().is_none());

        let state = dashboard.state().await;
        assert!(state.snapshot.is_none());
        assert!(!state.is_stale());
        assert!(state.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_refreshes_until_cancelled() {
        let (_client, access) = chain();
        let source = ScriptedWalletSource::new(&[W1]);
        let dashboard = Arc::new(dashboard(Ok(access), source.clone()));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let dashboard = dashboard.clone();
            let shutdown = shutdown.clone();
            async move { dashboard.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dashboard.snapshot().await.is_some());

        dashboard.request_refresh();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_cache_freshness_and_eviction() {
        let start = Instant::now();
        let mut cache = SnapshotCache::new(Duration::from_secs(30), Duration::from_secs(300));
        let events = Arc::new(EventSnapshot::default());

        cache.insert(1, events.clone(), start);
        cache.insert(2, events.clone(), start);

        assert!(cache.fresh(1, start + Duration::from_secs(10)).is_some());
        assert!(cache.fresh(1, start + Duration::from_secs(30)).is_none());
        assert_eq!(cache.len(), 2);

        // Key 2 last used at start, key 1 at +10s
        cache.evict(start + Duration::from_secs(301));
        assert_eq!(cache.len(), 1);
        assert!(cache.fresh(1, start + Duration::from_secs(400)).is_none());
        assert!(cache.is_empty());
    }
}
