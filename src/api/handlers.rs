use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::types::*;
use super::AppState;
use crate::analytics::{
    self, daily_series, fee_totals, summarize, table, top_wallets as rank_wallets,
    transfer_type_distribution, AmountRange, DEFAULT_TOP_WALLETS,
};
use crate::pipeline::{DashboardState, Snapshot};
use crate::wallet::canonical;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

const RPC_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

/// Current snapshot and refresh state, or 503 before the first success.
async fn published(state: &AppState) -> Result<(Arc<Snapshot>, DashboardState), ApiError> {
    let dashboard_state = state.dashboard.state().await;
    match dashboard_state.snapshot.clone() {
        Some(snapshot) => Ok((snapshot, dashboard_state)),
        None => {
            let reason = dashboard_state
                .last_error
                .as_deref()
                .unwrap_or("first refresh in progress");
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("No data available yet: {}", reason),
            ))
        }
    }
}

fn respond<T>(snapshot: &Snapshot, dashboard_state: &DashboardState, data: T) -> ApiResult<SnapshotResponse<T>> {
    Ok(Json(SnapshotResponse {
        refreshed_at: snapshot.refreshed_at,
        stale: dashboard_state.is_stale(),
        last_error: dashboard_state.last_error.clone(),
        data,
    }))
}

fn explorer_link(state: &AppState, kind: &str, id: &str) -> String {
    format!(
        "{}/{}/{}",
        state.contract.explorer_url.trim_end_matches('/'),
        kind,
        id
    )
}

// ============================================================
// Health & Contract
// ============================================================

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let dashboard_state = state.dashboard.state().await;

    let (current_block, rpc_error) = match state.dashboard.client() {
        Some(client) => {
            match tokio::time::timeout(RPC_PROBE_TIMEOUT, client.current_block_number()).await {
                Ok(Ok(block)) => (Some(block), None),
                Ok(Err(e)) => (None, Some(e.to_string())),
                Err(_) => (None, Some("RPC probe timed out".to_string())),
            }
        }
        None => (None, Some("RPC client not configured".to_string())),
    };

    let status = match (current_block.is_some(), dashboard_state.last_error.is_some()) {
        (true, false) => "ok",
        _ => "degraded",
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        rpc_reachable: current_block.is_some(),
        current_block,
        rpc_error,
        has_snapshot: dashboard_state.snapshot.is_some(),
        last_refresh: dashboard_state.snapshot.as_ref().map(|s| s.refreshed_at),
        last_attempt: dashboard_state.last_attempt,
        last_error: dashboard_state.last_error,
    }))
}

pub async fn contract(State(state): State<Arc<AppState>>) -> ApiResult<ContractResponse> {
    let link = |address: &str| {
        (!address.is_empty()).then(|| explorer_link(&state, "contract", address))
    };

    Ok(Json(ContractResponse {
        contract_url: link(&state.contract.address),
        contract_address: state.contract.address.clone(),
        proxy_url: link(&state.contract.proxy_address),
        proxy_address: state.contract.proxy_address.clone(),
        token_decimals: state.contract.token_decimals,
    }))
}

// ============================================================
// Aggregates
// ============================================================

pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<SummaryResponse>> {
    let (snapshot, dashboard_state) = published(&state).await?;
    let decimals = state.contract.token_decimals;
    let now = Utc::now().timestamp().max(0) as u64;

    let summary = summarize(
        &snapshot.events,
        snapshot.wallets.len(),
        snapshot.total_supply,
        now,
    );

    respond(
        &snapshot,
        &dashboard_state,
        SummaryResponse {
            active_wallets: summary.active_wallets,
            transfers_24h: summary.transfers_24h,
            total_volume: TokenAmount::new(summary.total_volume, decimals),
            deposits: summary.deposits,
            circulating_supply: TokenAmount::new(summary.circulating_supply, decimals),
        },
    )
}

pub async fn volume(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<Vec<VolumePoint>>> {
    let (snapshot, dashboard_state) = published(&state).await?;
    let decimals = state.contract.token_decimals;

    let moves = analytics::movements(&snapshot.events);
    let points = daily_series(moves.iter().copied(), &Local)
        .into_iter()
        .map(|b| VolumePoint {
            date: b.date,
            timestamp: b.timestamp,
            volume: TokenAmount::new(b.volume, decimals),
        })
        .collect();

    respond(&snapshot, &dashboard_state, points)
}

pub async fn transaction_counts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<Vec<CountPoint>>> {
    let (snapshot, dashboard_state) = published(&state).await?;

    let moves = analytics::movements(&snapshot.events);
    let points = daily_series(moves.iter().copied(), &Local)
        .into_iter()
        .map(|b| CountPoint {
            date: b.date,
            timestamp: b.timestamp,
            count: b.count,
        })
        .collect();

    respond(&snapshot, &dashboard_state, points)
}

pub async fn top_wallets(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<Vec<TopWalletEntry>>> {
    let (snapshot, dashboard_state) = published(&state).await?;

    let moves = analytics::movements(&snapshot.events);
    let entries = rank_wallets(moves.iter().copied(), DEFAULT_TOP_WALLETS)
        .into_iter()
        .map(|w| TopWalletEntry {
            address: canonical(&w.address),
            transaction_count: w.count,
        })
        .collect();

    respond(&snapshot, &dashboard_state, entries)
}

pub async fn fees(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<FeesResponse>> {
    let (snapshot, dashboard_state) = published(&state).await?;
    let decimals = state.contract.token_decimals;

    let totals = fee_totals(&snapshot.events.fees_collected);
    respond(
        &snapshot,
        &dashboard_state,
        FeesResponse {
            psb_fee: TokenAmount::new(totals.psb, decimals),
            importa_fee: TokenAmount::new(totals.importa, decimals),
            fg_fee: TokenAmount::new(totals.fg, decimals),
            total: TokenAmount::new(totals.total(), decimals),
        },
    )
}

pub async fn transfer_types(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SnapshotResponse<Vec<TransferTypeEntry>>> {
    let (snapshot, dashboard_state) = published(&state).await?;

    let entries = transfer_type_distribution(&snapshot.events.fees_collected)
        .into_iter()
        .map(|c| TransferTypeEntry {
            transfer_type: format!("{:?}", c.transfer_type).to_lowercase(),
            label: c.transfer_type.label().to_string(),
            count: c.count,
        })
        .collect();

    respond(&snapshot, &dashboard_state, entries)
}

// ============================================================
// Transactions
// ============================================================

pub async fn transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionParams>,
) -> ApiResult<SnapshotResponse<TransactionsResponse>> {
    let decimals = state.contract.token_decimals;
    let range = AmountRange::parse(
        params.min_amount.as_deref(),
        params.max_amount.as_deref(),
        decimals,
    )
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let (snapshot, dashboard_state) = published(&state).await?;

    let rows = range.filter(table::transaction_rows(&snapshot.events));
    let page = table::paginate(&rows, params.page.unwrap_or(1));

    let transactions = page
        .items
        .into_iter()
        .map(|row| {
            let hash = row.transaction_hash.to_string();
            TransactionEntry {
                kind: row.kind.as_str().to_string(),
                from: canonical(&row.from),
                to: canonical(&row.to),
                amount: TokenAmount::new(row.amount, decimals),
                block_number: row.block_number,
                explorer_url: explorer_link(&state, "transaction", &hash),
                transaction_hash: hash,
                timestamp: row.timestamp,
            }
        })
        .collect();

    respond(
        &snapshot,
        &dashboard_state,
        TransactionsResponse {
            transactions,
            page: page.page,
            page_size: table::PAGE_SIZE,
            total_pages: page.total_pages,
            total_items: page.total_items,
        },
    )
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> (StatusCode, Json<RefreshResponse>) {
    state.dashboard.request_refresh();
    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            status: "refresh requested".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::config::ContractConfig;
    use crate::indexer::testing::ScriptedWalletSource;
    use crate::pipeline::tests::chain;
    use crate::pipeline::Dashboard;
    use crate::wallet::WalletSource;
    use alloy::primitives::address;
    use serde_json::Value;

    async fn spawn_api(dashboard: Arc<Dashboard>) -> String {
        let contract = ContractConfig {
            proxy_address: "0x1111111111111111111111111111111111111111".to_string(),
            ..Default::default()
        };
        let app = router(dashboard, contract);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1", addr)
    }

    fn dashboard() -> Arc<Dashboard> {
        let (_client, access) = chain();
        let source = ScriptedWalletSource::new(&[
            address!("0x1000000000000000000000000000000000000001"),
            address!("0x2000000000000000000000000000000000000002"),
        ]);
        Arc::new(Dashboard::new(
            Ok(access),
            vec![source as Arc<dyn WalletSource>],
            Duration::from_secs(30),
            Duration::from_secs(300),
        ))
    }

    #[tokio::test]
    async fn test_data_endpoints_unavailable_before_first_snapshot() {
        let base = spawn_api(dashboard()).await;

        let response = reqwest::get(format!("{base}/summary")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let response = reqwest::get(format!("{base}/contract")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(
            body["proxy_url"],
            "https://hashscan.io/mainnet/contract/0x1111111111111111111111111111111111111111"
        );
        assert_eq!(body["contract_url"], Value::Null);
    }

    #[tokio::test]
    async fn test_snapshot_endpoints() {
        let dashboard = dashboard();
        dashboard.refresh(false).await.unwrap();
        let base = spawn_api(dashboard).await;

        let summary: Value = reqwest::get(format!("{base}/summary"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(summary["stale"], false);
        assert_eq!(summary["data"]["active_wallets"], 2);
        assert_eq!(summary["data"]["total_volume"]["raw"], "5");
        assert_eq!(summary["data"]["circulating_supply"]["raw"], "1000000");

        let wallets: Value = reqwest::get(format!("{base}/top-wallets"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(wallets["data"].as_array().unwrap().len(), 2);

        let txs: Value = reqwest::get(format!("{base}/transactions?page=1&min_amount="))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(txs["data"]["total_items"], 1);
        assert_eq!(txs["data"]["transactions"][0]["kind"], "Internal");
        let hash = format!("0x{}5a", "0".repeat(62));
        assert_eq!(txs["data"]["transactions"][0]["transaction_hash"], hash.as_str());
        assert_eq!(
            txs["data"]["transactions"][0]["explorer_url"],
            format!("https://hashscan.io/mainnet/transaction/{hash}").as_str()
        );
    }

    #[tokio::test]
    async fn test_invalid_amount_is_bad_request() {
        let dashboard = dashboard();
        dashboard.refresh(false).await.unwrap();
        let base = spawn_api(dashboard).await;

        let response = reqwest::get(format!("{base}/transactions?min_amount=lots"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = reqwest::get(format!("{base}/transactions?max_amount=1e10000000"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_is_accepted() {
        let base = spawn_api(dashboard()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/refresh"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    }
}
