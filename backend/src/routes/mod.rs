//! Route definitions for the Duka POS backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - product catalog
        .nest("/products", product_routes(state.clone()))
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes(state.clone()))
        // Protected routes - checkout and settlement
        .nest("/sales", sales_routes(state.clone()))
        // Protected routes - customers and store credit
        .nest("/customers", customer_routes(state))
}

/// Product catalog routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::create_inventory),
        )
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/valuation", get(handlers::get_valuation))
        .route(
            "/:inventory_id",
            get(handlers::get_inventory).delete(handlers::delete_inventory),
        )
        .route("/:inventory_id/pricing", put(handlers::update_pricing))
        .route(
            "/:inventory_id/batches",
            get(handlers::get_batches).post(handlers::post_batch),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Checkout and settlement routes (protected)
fn sales_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/stats", get(handlers::get_sales_stats))
        .route("/most-sold", get(handlers::get_most_sold))
        .route("/:sale_id", get(handlers::get_sale))
        .route("/:sale_id/complete", post(handlers::complete_sale))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Customer and store-credit routes (protected)
fn customer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .route("/:customer_id/payments", post(handlers::record_payment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
