pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ContractConfig;
use crate::pipeline::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub contract: ContractConfig,
}

pub fn router(dashboard: Arc<Dashboard>, contract: ContractConfig) -> Router {
    let state = Arc::new(AppState {
        dashboard,
        contract,
    });

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/contract", get(handlers::contract))
        .route("/api/v1/summary", get(handlers::summary))
        .route("/api/v1/volume", get(handlers::volume))
        .route(
            "/api/v1/transaction-counts",
            get(handlers::transaction_counts),
        )
        .route("/api/v1/top-wallets", get(handlers::top_wallets))
        .route("/api/v1/fees", get(handlers::fees))
        .route("/api/v1/transfer-types", get(handlers::transfer_types))
        .route("/api/v1/transactions", get(handlers::transactions))
        .route("/api/v1/refresh", post(handlers::refresh))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    dashboard: Arc<Dashboard>,
    contract: ContractConfig,
    host: &str,
    port: u16,
) -> eyre::Result<()> {
    let app = router(dashboard, contract);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
