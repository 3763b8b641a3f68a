//! Customer models for store-credit tracking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A credit-eligible buyer.
///
/// `current_balance` is the amount currently owed: increased by completed
/// credit sales, decreased (floored at zero) by recorded payments. It must
/// never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
    pub reputation_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}
