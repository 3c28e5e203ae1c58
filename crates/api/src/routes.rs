use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futfan_core::Symbol;
use futfan_engine::{aggregate, summary};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const BTC_SYMBOL: &str = "BTCUSDT";
const MAX_RECENT_TRADES_LIMIT: u32 = 1000;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Account trades
        .route("/fetch-trades", get(fetch_trades))
        // Market trades
        .route("/btc", get(btc_trades))
        .route("/allfut", get(all_futures_trades))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now(),
    }))
}

// ---------------------------------------------------------------------------
// Account trades
// ---------------------------------------------------------------------------

/// Trade counts of the account for every listed symbol.
async fn fetch_trades(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    const FAILED: &str = "Failed to fetch trades";

    let symbols = aggregate::all_symbols(state.exchange.as_ref())
        .await
        .map_err(ApiError::upstream(FAILED))?;

    let mut grouped =
        aggregate::account_trades_by_symbol(Arc::clone(&state.exchange), symbols, &state.fanout)
            .await
            .map_err(ApiError::upstream(FAILED))?;
    summary::sort_by_symbol(&mut grouped);

    for group in &grouped {
        debug!(symbol = %group.symbol, trades = group.len(), "Account trades");
    }
    debug!(total = summary::total_trades(&grouped), "Account trades collected");

    Ok(Json(summary::trade_counts(&grouped)))
}

// ---------------------------------------------------------------------------
// Market trades
// ---------------------------------------------------------------------------

async fn btc_trades(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let trades = state
        .exchange
        .recent_trades(&Symbol::from(BTC_SYMBOL), None)
        .await
        .map_err(ApiError::upstream("Failed to fetch BTCUSDT futures trades"))?;
    Ok(Json(trades))
}

#[derive(Debug, Deserialize)]
struct AllFuturesQuery {
    limit: Option<u32>,
}

/// Recent trades for every listed symbol.
async fn all_futures_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AllFuturesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILED: &str = "Failed to fetch all futures trades";

    let limit = match query.limit {
        None => state.recent_trades_limit,
        Some(n) if (1..=MAX_RECENT_TRADES_LIMIT).contains(&n) => n as u16,
        Some(_) => {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_RECENT_TRADES_LIMIT
            )))
        }
    };

    let symbols = aggregate::all_symbols(state.exchange.as_ref())
        .await
        .map_err(ApiError::upstream(FAILED))?;

    let mut grouped = aggregate::recent_trades_by_symbol(
        Arc::clone(&state.exchange),
        symbols,
        Some(limit),
        &state.fanout,
    )
    .await
    .map_err(ApiError::upstream(FAILED))?;
    summary::sort_by_symbol(&mut grouped);

    Ok(Json(grouped))
}
