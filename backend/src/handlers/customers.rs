//! HTTP handlers for customer and store-credit endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Customer;
use crate::services::customer::{
    CreateCustomerInput, CustomerService, RecordPaymentInput, UpdateCustomerInput,
};
use crate::AppState;

/// Register a customer
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let customer = CustomerService::new(state.db)
        .create_customer(current_user.0.business_id, input)
        .await?;
    Ok(Json(customer))
}

/// List customers for the business
pub async fn list_customers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = CustomerService::new(state.db)
        .list_customers(current_user.0.business_id)
        .await?;
    Ok(Json(customers))
}

/// Get a customer (balance display)
pub async fn get_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let customer = CustomerService::new(state.db)
        .get_customer(current_user.0.business_id, customer_id)
        .await?;
    Ok(Json(customer))
}

/// Update customer details
pub async fn update_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let customer = CustomerService::new(state.db)
        .update_customer(current_user.0.business_id, customer_id, input)
        .await?;
    Ok(Json(customer))
}

/// Record a payment against the outstanding balance
pub async fn record_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<Json<Customer>> {
    let customer = CustomerService::new(state.db)
        .record_payment(current_user.0.business_id, customer_id, input.amount)
        .await?;
    Ok(Json(customer))
}

/// Soft-delete a customer
pub async fn delete_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    CustomerService::new(state.db)
        .delete_customer(current_user.0.business_id, customer_id)
        .await?;
    Ok(Json(()))
}
