//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Product;

/// Product service for the catalog referenced by sales and inventory
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub default_price: Decimal,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub default_price: Option<Decimal>,
}

/// Row for product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    sku: Option<String>,
    unit: String,
    category: Option<String>,
    default_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            sku: row.sku,
            unit: row.unit,
            category: row.category,
            default_price: row.default_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted: row.deleted,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, business_id, name, sku, unit, category, default_price, created_at, updated_at, deleted";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(
        &self,
        business_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
            });
        }
        if input.default_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "default_price".to_string(),
                message: "Price cannot be negative".to_string(),
            });
        }

        // SKU is unique within a business when set
        if let Some(sku) = input.sku.as_deref().filter(|s| !s.is_empty()) {
            let sku_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE business_id = $1 AND sku = $2 AND deleted = false)",
            )
            .bind(business_id)
            .bind(sku)
            .fetch_one(&self.db)
            .await?;

            if sku_taken {
                return Err(AppError::DuplicateEntry("sku".to_string()));
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (business_id, name, sku, unit, category, default_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(&input.sku)
        .bind(input.unit.unwrap_or_else(|| "pcs".to_string()))
        .bind(&input.category)
        .bind(input.default_price)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Partial update of a product
    pub async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                sku = COALESCE($2, sku),
                unit = COALESCE($3, unit),
                category = COALESCE($4, category),
                default_price = COALESCE($5, default_price),
                updated_at = NOW()
            WHERE id = $6 AND business_id = $7 AND deleted = false
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.unit)
        .bind(&input.category)
        .bind(input.default_price)
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Get a product by ID
    pub async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND business_id = $2 AND deleted = false"
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products for a business
    pub async fn list_products(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE business_id = $1 AND deleted = false ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Soft-delete a product
    pub async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted = true, updated_at = NOW() WHERE id = $1 AND business_id = $2 AND deleted = false",
        )
        .bind(product_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }
}
