//! HTTP handlers for product catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Product;
use crate::services::product::{CreateProductInput, ProductService, UpdateProductInput};
use crate::AppState;

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let product = ProductService::new(state.db)
        .create_product(current_user.0.business_id, input)
        .await?;
    Ok(Json(product))
}

/// List products for the business
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let products = ProductService::new(state.db)
        .list_products(current_user.0.business_id)
        .await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = ProductService::new(state.db)
        .get_product(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(product))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let product = ProductService::new(state.db)
        .update_product(current_user.0.business_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Soft-delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    ProductService::new(state.db)
        .delete_product(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(()))
}
