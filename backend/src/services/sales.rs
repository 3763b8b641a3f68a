//! Sale settlement service
//!
//! Owns the sale lifecycle: a sale is created pending together with its line
//! items, then settled in a single transaction that decrements inventory once
//! per line item and books the on-credit portion onto the customer's balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchType, MostSoldProduct, PaymentMethod, Sale, SaleItem, SaleStatus, SalesStats,
};
use crate::services::inventory::{InventoryService, PostBatchInput};
use shared::types::{DateRange, Pagination};
use shared::validation::{
    line_total, validate_line_item, validate_payment_split, validate_subtotal,
};

/// Sales service for checkout and settlement
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    allow_negative_stock: bool,
}

/// Input for creating a pending sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub amount_paid: Decimal,
    pub amount_on_credit: Decimal,
    pub items: Vec<SaleItemInput>,
}

/// One cart line on a new sale
#[derive(Debug, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// A sale together with its line items
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Row for sale queries (enums as stored text)
#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    store_id: Uuid,
    user_id: Uuid,
    customer_id: Option<Uuid>,
    subtotal: Decimal,
    discount_amount: Decimal,
    discount_percentage: Decimal,
    total_amount: Decimal,
    payment_method: String,
    on_credit: bool,
    amount_paid: Decimal,
    amount_on_credit: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_model(self) -> AppResult<Sale> {
        let payment_method = match self.payment_method.as_str() {
            "cash" => PaymentMethod::Cash,
            "mpesa" => PaymentMethod::Mpesa,
            "store_credit" => PaymentMethod::StoreCredit,
            "split" => PaymentMethod::Split,
            other => {
                return Err(AppError::Internal(format!(
                    "unknown payment method: {}",
                    other
                )))
            }
        };
        let status = match self.status.as_str() {
            "pending" => SaleStatus::Pending,
            "completed" => SaleStatus::Completed,
            other => return Err(AppError::Internal(format!("unknown sale status: {}", other))),
        };
        Ok(Sale {
            id: self.id,
            store_id: self.store_id,
            user_id: self.user_id,
            customer_id: self.customer_id,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            discount_percentage: self.discount_percentage,
            total_amount: self.total_amount,
            payment_method,
            on_credit: self.on_credit,
            amount_paid: self.amount_paid,
            amount_on_credit: self.amount_on_credit,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for sale item queries
#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
    total_price: Decimal,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        }
    }
}

/// Row for most-sold aggregation
#[derive(Debug, FromRow)]
struct MostSoldRow {
    product_id: Uuid,
    product_name: String,
    quantity_sold: Decimal,
    sale_count: i64,
    current_price: Option<Decimal>,
    current_stock: Option<Decimal>,
}

const SALE_COLUMNS: &str = "id, store_id, user_id, customer_id, subtotal, discount_amount, \
     discount_percentage, total_amount, payment_method, on_credit, amount_paid, amount_on_credit, \
     status, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, quantity, unit_price, total_price";

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool, allow_negative_stock: bool) -> Self {
        Self {
            db,
            allow_negative_stock,
        }
    }

    /// Create a pending sale with its line items, atomically.
    ///
    /// Inventory and customer balance are untouched until completion.
    pub async fn create_sale(
        &self,
        business_id: Uuid,
        store_id: Uuid,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale needs at least one line item".to_string(),
            });
        }

        validate_payment_split(input.total_amount, input.amount_paid, input.amount_on_credit)
            .map_err(|msg| AppError::Validation {
                field: "amount_paid/amount_on_credit".to_string(),
                message: msg.to_string(),
            })?;

        let mut line_totals = Vec::with_capacity(input.items.len());
        for item in &input.items {
            validate_line_item(item.quantity, item.unit_price).map_err(|msg| {
                AppError::Validation {
                    field: "items".to_string(),
                    message: msg.to_string(),
                }
            })?;
            line_totals.push(line_total(item.quantity, item.unit_price));
        }

        validate_subtotal(&line_totals, input.subtotal).map_err(|msg| AppError::Validation {
            field: "subtotal".to_string(),
            message: msg.to_string(),
        })?;

        // The on-credit flag is derived, never trusted from the caller
        let on_credit = input.amount_on_credit > Decimal::ZERO;

        // Validate customer exists and belongs to the business if provided
        if let Some(customer_id) = input.customer_id {
            let customer_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND business_id = $2 AND deleted = false)",
            )
            .bind(customer_id)
            .bind(business_id)
            .fetch_one(&self.db)
            .await?;

            if !customer_exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        let mut tx = self.db.begin().await?;

        let sale_row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (store_id, user_id, customer_id, subtotal, discount_amount,
                               discount_percentage, total_amount, payment_method, on_credit,
                               amount_paid, amount_on_credit, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(store_id)
        .bind(user_id)
        .bind(input.customer_id)
        .bind(input.subtotal)
        .bind(input.discount_amount)
        .bind(input.discount_percentage)
        .bind(input.total_amount)
        .bind(input.payment_method.as_str())
        .bind(on_credit)
        .bind(input.amount_paid)
        .bind(input.amount_on_credit)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (item, total) in input.items.iter().zip(line_totals) {
            let item_row = sqlx::query_as::<_, SaleItemRow>(&format!(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {SALE_ITEM_COLUMNS}
                "#
            ))
            .bind(sale_row.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(total)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item_row.into());
        }

        tx.commit().await?;

        Ok(SaleWithItems {
            sale: sale_row.into_model()?,
            items,
        })
    }

    /// Settle a pending sale.
    ///
    /// One transaction covers the whole settlement: the per-line-item ledger
    /// posts, the status flip, and the customer balance update. Any failure
    /// rolls everything back, so a partially settled sale is never observable.
    /// Completing a sale that is not pending is rejected with an explicit
    /// error rather than treated as a no-op.
    pub async fn complete_sale(
        &self,
        business_id: Uuid,
        store_id: Uuid,
        user_id: Uuid,
        sale_id: Uuid,
    ) -> AppResult<Sale> {
        let inventory = InventoryService::new(self.db.clone(), self.allow_negative_stock);

        let mut tx = self.db.begin().await?;

        // Lock the sale row; a concurrent completion waits here and then
        // fails the status check.
        let sale_row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND store_id = $2 FOR UPDATE"
        ))
        .bind(sale_id)
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        if sale_row.status != "pending" {
            return Err(AppError::InvalidStateTransition(format!(
                "Sale is already {}",
                sale_row.status
            )));
        }

        let items = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = $1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        // One ledger post per line item
        for item in &items {
            let inventory_id = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM inventory_records WHERE product_id = $1 AND store_id = $2 AND deleted = false",
            )
            .bind(item.product_id)
            .bind(store_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(inventory_id) = inventory_id else {
                // Known gap: products sold without a stock record skip the
                // ledger so the rest of the settlement can proceed.
                tracing::warn!(
                    sale_id = %sale_id,
                    product_id = %item.product_id,
                    "no inventory record for sold product; skipping stock posting"
                );
                continue;
            };

            inventory
                .post_batch_tx(
                    &mut tx,
                    store_id,
                    user_id,
                    inventory_id,
                    PostBatchInput {
                        quantity_change: -item.quantity,
                        cost_per_unit: None,
                        batch_type: BatchType::Sale,
                        reference_id: Some(sale_id),
                        notes: None,
                    },
                )
                .await?;
        }

        let completed = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        // Book the on-credit portion onto the customer's running balance.
        // The UPDATE takes a row lock, serializing against concurrent
        // payment recording for the same customer.
        if completed.on_credit {
            if let Some(customer_id) = completed.customer_id {
                let result = sqlx::query(
                    r#"
                    UPDATE customers
                    SET current_balance = current_balance + $1, updated_at = NOW()
                    WHERE id = $2 AND business_id = $3 AND deleted = false
                    "#,
                )
                .bind(completed.total_amount)
                .bind(customer_id)
                .bind(business_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound("Customer".to_string()));
                }
            }
        }

        tx.commit().await?;

        completed.into_model()
    }

    /// Get a sale with its line items
    pub async fn get_sale(&self, store_id: Uuid, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let sale_row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND store_id = $2"
        ))
        .bind(sale_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = $1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems {
            sale: sale_row.into_model()?,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// List sales for a store, most recent first
    pub async fn list_sales(
        &self,
        store_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE store_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(store_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SaleRow::into_model).collect()
    }

    /// Aggregate figures over completed sales in a date range
    pub async fn get_sales_stats(
        &self,
        store_id: Uuid,
        range: DateRange,
    ) -> AppResult<SalesStats> {
        let row = sqlx::query_as::<_, (i64, Option<Decimal>, Option<Decimal>, Option<Decimal>)>(
            r#"
            SELECT COUNT(*),
                   SUM(total_amount),
                   SUM(discount_amount),
                   SUM(amount_on_credit)
            FROM sales
            WHERE store_id = $1 AND status = 'completed'
              AND created_at >= $2 AND created_at <= $3
            "#,
        )
        .bind(store_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.db)
        .await?;

        Ok(SalesStats {
            sale_count: row.0,
            total_revenue: row.1.unwrap_or(Decimal::ZERO),
            total_discount: row.2.unwrap_or(Decimal::ZERO),
            total_on_credit: row.3.unwrap_or(Decimal::ZERO),
        })
    }

    /// Products ranked by quantity sold over a lookback window, joined with
    /// current inventory for display price and stock on hand
    pub async fn get_most_sold_products(
        &self,
        store_id: Uuid,
        days: i64,
        limit: i64,
    ) -> AppResult<Vec<MostSoldProduct>> {
        let rows = sqlx::query_as::<_, MostSoldRow>(
            r#"
            SELECT si.product_id,
                   p.name AS product_name,
                   SUM(si.quantity) AS quantity_sold,
                   COUNT(DISTINCT s.id) AS sale_count,
                   ir.price AS current_price,
                   ir.quantity AS current_stock
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            LEFT JOIN inventory_records ir
                   ON ir.product_id = si.product_id AND ir.store_id = s.store_id AND ir.deleted = false
            WHERE s.store_id = $1 AND s.status = 'completed'
              AND s.created_at >= NOW() - ($2 || ' days')::interval
            GROUP BY si.product_id, p.name, ir.price, ir.quantity
            ORDER BY SUM(si.quantity) DESC
            LIMIT $3
            "#,
        )
        .bind(store_id)
        .bind(days.to_string())
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MostSoldProduct {
                product_id: r.product_id,
                product_name: r.product_name,
                quantity_sold: r.quantity_sold,
                sale_count: r.sale_count,
                current_price: r.current_price,
                current_stock: r.current_stock,
            })
            .collect())
    }
}
