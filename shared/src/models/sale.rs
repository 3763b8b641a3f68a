//! Sale and sale line item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One checkout transaction.
///
/// `amount_paid + amount_on_credit == total_amount` (within rounding
/// tolerance) and `on_credit` is true iff `amount_on_credit > 0`. Status
/// starts `pending` and transitions to `completed` exactly once; a sale is a
/// financial record and is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub store_id: Uuid,
    /// Cashier who rang the sale
    pub user_id: Uuid,
    /// Absent for walk-in cash sales
    pub customer_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub on_credit: bool,
    pub amount_paid: Decimal,
    pub amount_on_credit: Decimal,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line on a sale. `total_price = quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Sale lifecycle: pending -> completed (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
        }
    }
}

/// How a sale was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Mpesa,
    StoreCredit,
    Split,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::StoreCredit => "store_credit",
            PaymentMethod::Split => "split",
        }
    }
}

/// Aggregated sales figures over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesStats {
    pub sale_count: i64,
    pub total_revenue: Decimal,
    pub total_discount: Decimal,
    pub total_on_credit: Decimal,
}

/// A product ranked by quantity sold over a lookback window, joined with
/// current inventory for display price and stock on hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostSoldProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: Decimal,
    pub sale_count: i64,
    pub current_price: Option<Decimal>,
    pub current_stock: Option<Decimal>,
}
