//! Inventory models: per-store stock records and the batch ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock record for one (product, store) pair.
///
/// `quantity` is always the sum of all batch `quantity_change` values ever
/// posted against this record; the ledger can reconstruct it from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    /// Signed; fractional for weight-based units. May go negative when
    /// overselling is allowed.
    pub quantity: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    /// Retail price
    pub price: Decimal,
    pub wholesale_price: Option<Decimal>,
    /// Moving average unit cost, recomputed on purchase batches
    pub weighted_avg_cost: Decimal,
    pub last_purchase_price: Option<Decimal>,
    pub location: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

/// One stock-affecting event. Append-only, immutable once written.
///
/// For a given `inventory_id` the batches form a total order:
/// `quantity_before` of batch N+1 equals `quantity_after` of batch N, and
/// `quantity_after == quantity_before + quantity_change` always.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBatch {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    /// Actor who posted the batch
    pub user_id: Uuid,
    pub quantity_change: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub cost_per_unit: Option<Decimal>,
    pub batch_type: BatchType,
    /// Links back to the originating sale or purchase
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Kinds of stock-affecting events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    Purchase,
    Sale,
    Adjustment,
    Return,
    Damage,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::Purchase => "purchase",
            BatchType::Sale => "sale",
            BatchType::Adjustment => "adjustment",
            BatchType::Return => "return",
            BatchType::Damage => "damage",
        }
    }
}

impl std::str::FromStr for BatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(BatchType::Purchase),
            "sale" => Ok(BatchType::Sale),
            "adjustment" => Ok(BatchType::Adjustment),
            "return" => Ok(BatchType::Return),
            "damage" => Ok(BatchType::Damage),
            other => Err(format!("unknown batch type: {}", other)),
        }
    }
}
