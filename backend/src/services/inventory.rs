//! Inventory ledger service
//!
//! Owns per-(product, store) stock levels and the moving weighted-average
//! cost basis. Every quantity change is recorded as an immutable batch entry,
//! so a record's quantity is always reconstructable by summing its ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{BatchType, InventoryBatch, InventoryRecord};
use shared::validation::{validate_batch_quantity, weighted_average_cost};

/// Inventory service for managing stock records and the batch ledger
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    allow_negative_stock: bool,
}

/// Input for onboarding a product into a store
#[derive(Debug, Deserialize)]
pub struct CreateInventoryInput {
    pub product_id: Uuid,
    pub price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub location: Option<String>,
    /// Optional opening stock, posted as an adjustment batch so the ledger
    /// stays complete from the first unit.
    pub opening_quantity: Option<Decimal>,
}

/// Input for posting a batch against an inventory record
#[derive(Debug, Deserialize)]
pub struct PostBatchInput {
    pub quantity_change: Decimal,
    pub cost_per_unit: Option<Decimal>,
    pub batch_type: BatchType,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Partial update of non-ledgered fields; no batch is recorded
#[derive(Debug, Deserialize)]
pub struct UpdatePricingInput {
    pub price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub location: Option<String>,
}

/// Stock valuation rollup for a store
#[derive(Debug, Clone, Serialize)]
pub struct StoreValuation {
    pub store_id: Uuid,
    pub item_count: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

/// Row for inventory record queries
#[derive(Debug, FromRow)]
struct InventoryRow {
    id: Uuid,
    product_id: Uuid,
    store_id: Uuid,
    quantity: Decimal,
    min_stock: Decimal,
    max_stock: Decimal,
    price: Decimal,
    wholesale_price: Option<Decimal>,
    weighted_avg_cost: Decimal,
    last_purchase_price: Option<Decimal>,
    location: Option<String>,
    last_updated: DateTime<Utc>,
    created_at: DateTime<Utc>,
    deleted: bool,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            id: row.id,
            product_id: row.product_id,
            store_id: row.store_id,
            quantity: row.quantity,
            min_stock: row.min_stock,
            max_stock: row.max_stock,
            price: row.price,
            wholesale_price: row.wholesale_price,
            weighted_avg_cost: row.weighted_avg_cost,
            last_purchase_price: row.last_purchase_price,
            location: row.location,
            last_updated: row.last_updated,
            created_at: row.created_at,
            deleted: row.deleted,
        }
    }
}

/// Row for batch queries (batch_type as stored text)
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    inventory_id: Uuid,
    product_id: Uuid,
    store_id: Uuid,
    user_id: Uuid,
    quantity_change: Decimal,
    quantity_before: Decimal,
    quantity_after: Decimal,
    cost_per_unit: Option<Decimal>,
    batch_type: String,
    reference_id: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_model(self) -> AppResult<InventoryBatch> {
        let batch_type = self
            .batch_type
            .parse::<BatchType>()
            .map_err(AppError::Internal)?;
        Ok(InventoryBatch {
            id: self.id,
            inventory_id: self.inventory_id,
            product_id: self.product_id,
            store_id: self.store_id,
            user_id: self.user_id,
            quantity_change: self.quantity_change,
            quantity_before: self.quantity_before,
            quantity_after: self.quantity_after,
            cost_per_unit: self.cost_per_unit,
            batch_type,
            reference_id: self.reference_id,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

const INVENTORY_COLUMNS: &str = "id, product_id, store_id, quantity, min_stock, max_stock, price, \
     wholesale_price, weighted_avg_cost, last_purchase_price, location, last_updated, created_at, deleted";

const BATCH_COLUMNS: &str = "id, inventory_id, product_id, store_id, user_id, quantity_change, \
     quantity_before, quantity_after, cost_per_unit, batch_type, reference_id, notes, created_at";

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool, allow_negative_stock: bool) -> Self {
        Self {
            db,
            allow_negative_stock,
        }
    }

    /// Onboard a product into a store at a zero-quantity baseline
    pub async fn create_inventory(
        &self,
        business_id: Uuid,
        store_id: Uuid,
        user_id: Uuid,
        input: CreateInventoryInput,
    ) -> AppResult<InventoryRecord> {
        if input.price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Price cannot be negative".to_string(),
            });
        }

        // Validate product exists and belongs to the business
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND business_id = $2 AND deleted = false)",
        )
        .bind(input.product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let already_stocked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_records WHERE product_id = $1 AND store_id = $2)",
        )
        .bind(input.product_id)
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        if already_stocked {
            return Err(AppError::DuplicateEntry("product/store".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventory_records (product_id, store_id, quantity, min_stock, max_stock,
                                           price, wholesale_price, weighted_avg_cost, location)
            VALUES ($1, $2, 0, $3, $4, $5, $6, 0, $7)
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(input.product_id)
        .bind(store_id)
        .bind(input.min_stock.unwrap_or(Decimal::ZERO))
        .bind(input.max_stock.unwrap_or(Decimal::ZERO))
        .bind(input.price)
        .bind(input.wholesale_price)
        .bind(&input.location)
        .fetch_one(&mut *tx)
        .await?;

        let inventory_id = row.id;
        let mut record: InventoryRecord = row.into();

        // Opening stock goes through the ledger like any other change
        if let Some(opening) = input.opening_quantity.filter(|q| *q != Decimal::ZERO) {
            self.post_batch_tx(
                &mut tx,
                store_id,
                user_id,
                inventory_id,
                PostBatchInput {
                    quantity_change: opening,
                    cost_per_unit: None,
                    batch_type: BatchType::Adjustment,
                    reference_id: None,
                    notes: Some("Opening stock".to_string()),
                },
            )
            .await?;
            record.quantity = opening;
        }

        tx.commit().await?;

        Ok(record)
    }

    /// Post a batch against an inventory record.
    ///
    /// The whole read-modify-write runs in one transaction so no other post
    /// can interleave and observe a torn intermediate state.
    pub async fn post_batch(
        &self,
        store_id: Uuid,
        user_id: Uuid,
        inventory_id: Uuid,
        input: PostBatchInput,
    ) -> AppResult<InventoryBatch> {
        let mut tx = self.db.begin().await?;
        let batch = self
            .post_batch_tx(&mut tx, store_id, user_id, inventory_id, input)
            .await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// Post a batch inside a caller-owned transaction.
    ///
    /// Sale settlement uses this to make its per-line-item decrements part of
    /// one atomic settlement. The `FOR UPDATE` row lock serializes concurrent
    /// posts against the same record, which is what keeps the batch chain
    /// totally ordered (quantity_before of post N+1 equals quantity_after of
    /// post N).
    pub(crate) async fn post_batch_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        store_id: Uuid,
        user_id: Uuid,
        inventory_id: Uuid,
        input: PostBatchInput,
    ) -> AppResult<InventoryBatch> {
        validate_batch_quantity(input.quantity_change).map_err(|msg| AppError::Validation {
            field: "quantity_change".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            SELECT {INVENTORY_COLUMNS}
            FROM inventory_records
            WHERE id = $1 AND store_id = $2 AND deleted = false
            FOR UPDATE
            "#
        ))
        .bind(inventory_id)
        .bind(store_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        let quantity_before = row.quantity;
        let quantity_after = quantity_before + input.quantity_change;

        if !self.allow_negative_stock
            && input.quantity_change < Decimal::ZERO
            && quantity_after < Decimal::ZERO
        {
            return Err(AppError::InsufficientStock(format!(
                "{} in stock, {} requested",
                quantity_before,
                input.quantity_change.abs()
            )));
        }

        // Weighted-average cost only moves on priced purchase batches
        let mut weighted_avg_cost = row.weighted_avg_cost;
        let mut last_purchase_price = row.last_purchase_price;
        if input.batch_type == BatchType::Purchase {
            if let Some(cost) = input.cost_per_unit.filter(|c| *c > Decimal::ZERO) {
                weighted_avg_cost = weighted_average_cost(
                    row.weighted_avg_cost,
                    quantity_before,
                    cost,
                    input.quantity_change,
                );
                last_purchase_price = Some(cost);
            }
        }

        sqlx::query(
            r#"
            UPDATE inventory_records
            SET quantity = $1, weighted_avg_cost = $2, last_purchase_price = $3, last_updated = NOW()
            WHERE id = $4
            "#,
        )
        .bind(quantity_after)
        .bind(weighted_avg_cost)
        .bind(last_purchase_price)
        .bind(inventory_id)
        .execute(&mut **tx)
        .await?;

        let batch = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO inventory_batches (inventory_id, product_id, store_id, user_id,
                                           quantity_change, quantity_before, quantity_after,
                                           cost_per_unit, batch_type, reference_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(inventory_id)
        .bind(row.product_id)
        .bind(store_id)
        .bind(user_id)
        .bind(input.quantity_change)
        .bind(quantity_before)
        .bind(quantity_after)
        .bind(input.cost_per_unit)
        .bind(input.batch_type.as_str())
        .bind(input.reference_id)
        .bind(&input.notes)
        .fetch_one(&mut **tx)
        .await?;

        batch.into_model()
    }

    /// Partial update of non-ledgered fields (pricing, thresholds, location)
    pub async fn update_pricing(
        &self,
        store_id: Uuid,
        inventory_id: Uuid,
        input: UpdatePricingInput,
    ) -> AppResult<InventoryRecord> {
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "price".to_string(),
                    message: "Price cannot be negative".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            UPDATE inventory_records
            SET price = COALESCE($1, price),
                wholesale_price = COALESCE($2, wholesale_price),
                min_stock = COALESCE($3, min_stock),
                max_stock = COALESCE($4, max_stock),
                location = COALESCE($5, location),
                last_updated = NOW()
            WHERE id = $6 AND store_id = $7 AND deleted = false
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(input.price)
        .bind(input.wholesale_price)
        .bind(input.min_stock)
        .bind(input.max_stock)
        .bind(&input.location)
        .bind(inventory_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        Ok(row.into())
    }

    /// Get an inventory record by ID
    pub async fn get_inventory(
        &self,
        store_id: Uuid,
        inventory_id: Uuid,
    ) -> AppResult<InventoryRecord> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_records WHERE id = $1 AND store_id = $2 AND deleted = false"
        ))
        .bind(inventory_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        Ok(row.into())
    }

    /// Resolve the inventory record for a (product, store) pair
    pub async fn get_by_product(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_records WHERE product_id = $1 AND store_id = $2 AND deleted = false"
        ))
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all inventory records for a store
    pub async fn list_inventory(&self, store_id: Uuid) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_records WHERE store_id = $1 AND deleted = false ORDER BY created_at DESC"
        ))
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Records at or below their reorder threshold
    pub async fn get_low_stock(&self, store_id: Uuid) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            SELECT {INVENTORY_COLUMNS}
            FROM inventory_records
            WHERE store_id = $1 AND deleted = false AND quantity <= min_stock
            ORDER BY quantity ASC
            "#
        ))
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Ledger history for a record, most recent first
    pub async fn get_batches(
        &self,
        store_id: Uuid,
        inventory_id: Uuid,
    ) -> AppResult<Vec<InventoryBatch>> {
        // Validate the record belongs to the store
        self.get_inventory(store_id, inventory_id).await?;

        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM inventory_batches
            WHERE inventory_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(inventory_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(BatchRow::into_model).collect()
    }

    /// Stock valuation rollup (quantity x weighted average cost) for a store
    pub async fn get_valuation(&self, store_id: Uuid) -> AppResult<StoreValuation> {
        let row = sqlx::query_as::<_, (i64, Option<Decimal>, Option<Decimal>)>(
            r#"
            SELECT COUNT(*),
                   SUM(quantity),
                   SUM(quantity * weighted_avg_cost)
            FROM inventory_records
            WHERE store_id = $1 AND deleted = false
            "#,
        )
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        Ok(StoreValuation {
            store_id,
            item_count: row.0,
            total_quantity: row.1.unwrap_or(Decimal::ZERO),
            total_value: row.2.unwrap_or(Decimal::ZERO),
        })
    }

    /// Soft-delete an inventory record; the ledger history is kept
    pub async fn delete_inventory(&self, store_id: Uuid, inventory_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE inventory_records SET deleted = true, last_updated = NOW() WHERE id = $1 AND store_id = $2 AND deleted = false",
        )
        .bind(inventory_id)
        .bind(store_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory record".to_string()));
        }

        Ok(())
    }
}
