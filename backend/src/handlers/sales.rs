//! HTTP handlers for checkout and settlement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{MostSoldProduct, Sale, SalesStats};
use crate::services::sales::{CreateSaleInput, SaleWithItems, SalesService};
use crate::AppState;
use shared::types::{DateRange, Pagination};

fn service(state: AppState) -> SalesService {
    SalesService::new(state.db, state.config.pos.allow_negative_stock)
}

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Query parameters for sales stats
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Query parameters for the most-sold ranking
#[derive(Debug, Deserialize)]
pub struct MostSoldQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

/// Create a pending sale with its line items
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithItems>> {
    let sale = service(state)
        .create_sale(
            current_user.0.business_id,
            current_user.0.store_id,
            current_user.0.user_id,
            input,
        )
        .await?;
    Ok(Json(sale))
}

/// Settle a pending sale: decrement stock, book credit, mark completed
pub async fn complete_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let sale = service(state)
        .complete_sale(
            current_user.0.business_id,
            current_user.0.store_id,
            current_user.0.user_id,
            sale_id,
        )
        .await?;
    Ok(Json(sale))
}

/// Get a sale with its line items (receipt view)
pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let sale = service(state)
        .get_sale(current_user.0.store_id, sale_id)
        .await?;
    Ok(Json(sale))
}

/// List sales for the current store
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let sales = service(state)
        .list_sales(current_user.0.store_id, pagination)
        .await?;
    Ok(Json(sales))
}

/// Aggregate figures over completed sales in a date range
pub async fn get_sales_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<SalesStats>> {
    let stats = service(state)
        .get_sales_stats(
            current_user.0.store_id,
            DateRange::new(query.from, query.to),
        )
        .await?;
    Ok(Json(stats))
}

/// Products ranked by quantity sold over a lookback window
pub async fn get_most_sold(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MostSoldQuery>,
) -> AppResult<Json<Vec<MostSoldProduct>>> {
    let products = service(state)
        .get_most_sold_products(
            current_user.0.store_id,
            query.days.unwrap_or(30),
            query.limit.unwrap_or(10),
        )
        .await?;
    Ok(Json(products))
}
