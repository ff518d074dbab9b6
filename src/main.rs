use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tngn_analytics::config::Config;
use tngn_analytics::error::{PipelineError, PipelineResult};
use tngn_analytics::indexer::client::connect_http;
use tngn_analytics::pipeline::{ChainAccess, Dashboard};
use tngn_analytics::wallet::HttpWalletSource;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Client and cycle settings, or the configuration problem that prevents
/// building them. Reported by the refresh loop rather than at startup.
fn chain_access(config: &Config) -> PipelineResult<ChainAccess> {
    let rpc_url = config.rpc_url()?;
    let client = connect_http(rpc_url).map_err(|e| PipelineError::Config(e.to_string()))?;
    Ok(ChainAccess {
        client: Arc::new(client),
        settings: config.fetch_settings()?,
    })
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for per-chunk output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("tNGN analytics starting");

    // Explicit path, then ./config.toml, then environment only
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = Config::load(&path)?;
            tracing::info!("Configuration loaded from {}", path);
            config
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            let config = Config::load(DEFAULT_CONFIG_PATH)?;
            tracing::info!("Configuration loaded from {}", DEFAULT_CONFIG_PATH);
            config
        }
        None => {
            tracing::info!("No config file, using defaults and environment");
            Config::from_env()?
        }
    };

    tracing::info!(
        wallet_sources = config.wallets.sources.len(),
        taxonomy = config.indexer.taxonomy.as_str(),
        window_days = config.indexer.window_days,
        stale_time_ms = config.cache.stale_time_ms,
        "Configuration ready"
    );

    let chain = chain_access(&config);
    if let Err(e) = &chain {
        tracing::warn!(error = %e, "Chain access not configured, refreshes will fail until fixed");
    }

    let sources = HttpWalletSource::from_urls(&config.wallets.sources)?;
    let dashboard = Arc::new(Dashboard::from_config(&config, chain, sources));

    // Spawn API server
    if config.api.enabled {
        let dashboard = dashboard.clone();
        let contract = config.contract.clone();
        let host = config.api.host.clone();
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = tngn_analytics::api::serve(dashboard, contract, &host, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    // Create shutdown signal
    let shutdown = CancellationToken::new();

    let refresh_loop = tokio::spawn({
        let dashboard = dashboard.clone();
        let shutdown = shutdown.clone();
        async move { dashboard.run(shutdown).await }
    });

    tracing::info!("Refresh loop started. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping refresh loop...");
    shutdown.cancel();

    let _ = refresh_loop.await;

    tracing::info!("tNGN analytics stopped gracefully");
    Ok(())
}
