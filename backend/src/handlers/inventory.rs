//! HTTP handlers for inventory ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{InventoryBatch, InventoryRecord};
use crate::services::inventory::{
    CreateInventoryInput, InventoryService, PostBatchInput, StoreValuation, UpdatePricingInput,
};
use crate::AppState;

fn service(state: AppState) -> InventoryService {
    InventoryService::new(state.db, state.config.pos.allow_negative_stock)
}

/// Onboard a product into the current store
pub async fn create_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInventoryInput>,
) -> AppResult<Json<InventoryRecord>> {
    let record = service(state)
        .create_inventory(
            current_user.0.business_id,
            current_user.0.store_id,
            current_user.0.user_id,
            input,
        )
        .await?;
    Ok(Json(record))
}

/// List inventory records for the current store
pub async fn list_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryRecord>>> {
    let records = service(state).list_inventory(current_user.0.store_id).await?;
    Ok(Json(records))
}

/// Get a single inventory record
pub async fn get_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<InventoryRecord>> {
    let record = service(state)
        .get_inventory(current_user.0.store_id, inventory_id)
        .await?;
    Ok(Json(record))
}

/// Post a batch (stock receiving, adjustment, damage, return)
pub async fn post_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
    Json(input): Json<PostBatchInput>,
) -> AppResult<Json<InventoryBatch>> {
    let batch = service(state)
        .post_batch(
            current_user.0.store_id,
            current_user.0.user_id,
            inventory_id,
            input,
        )
        .await?;
    Ok(Json(batch))
}

/// Ledger history for a record
pub async fn get_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryBatch>>> {
    let batches = service(state)
        .get_batches(current_user.0.store_id, inventory_id)
        .await?;
    Ok(Json(batches))
}

/// Update pricing, thresholds, or location (no ledger entry)
pub async fn update_pricing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
    Json(input): Json<UpdatePricingInput>,
) -> AppResult<Json<InventoryRecord>> {
    let record = service(state)
        .update_pricing(current_user.0.store_id, inventory_id, input)
        .await?;
    Ok(Json(record))
}

/// Records at or below their reorder threshold
pub async fn get_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryRecord>>> {
    let records = service(state).get_low_stock(current_user.0.store_id).await?;
    Ok(Json(records))
}

/// Stock valuation rollup for the current store
pub async fn get_valuation(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<StoreValuation>> {
    let valuation = service(state).get_valuation(current_user.0.store_id).await?;
    Ok(Json(valuation))
}

/// Soft-delete an inventory record
pub async fn delete_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    service(state)
        .delete_inventory(current_user.0.store_id, inventory_id)
        .await?;
    Ok(Json(()))
}
