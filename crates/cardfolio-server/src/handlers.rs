use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use cardfolio::market_data::{ListingRepository, ListingsError};
use cardfolio::models::{ListingRecord, ListingsPage, PageWindow, WalletHoldings};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HoldingsQuery {
    pub wallet: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_wallet_holdings(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HoldingsQuery>,
) -> ApiResult<Json<WalletHoldings>> {
    let wallet = q.wallet.unwrap_or_default();
    let offset = q.offset.unwrap_or(0);
    let limit = q.limit.unwrap_or(state.default_limit);
    let holdings = state.enrichment.enrich(&wallet, offset, limit).await?;
    Ok(Json(holdings))
}

pub async fn get_listings(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ListingRecord>>> {
    let repo = state.listings.as_ref().ok_or(ListingsError::NotConfigured)?;
    let rows = repo.listed().await.map_err(ListingsError::Query)?;
    Ok(Json(rows))
}

pub async fn get_deals(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DealsQuery>,
) -> ApiResult<Json<ListingsPage>> {
    let repo = state.listings.as_ref().ok_or(ListingsError::NotConfigured)?;
    let window = PageWindow::clamp(
        q.page.unwrap_or(1),
        q.limit.unwrap_or(i64::from(PageWindow::DEFAULT_LIMIT)),
    );
    let page = repo.page(window).await.map_err(ListingsError::Query)?;
    Ok(Json(page))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
