//! Customer service for registration and store-credit tracking
//!
//! The running balance is only ever increased by completed credit sales
//! (sale settlement) and decreased, floored at zero, by payments recorded
//! here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Customer;
use shared::validation::validate_payment_amount;

/// Customer service for credit-eligible buyers
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Input for registering a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub credit_limit: Option<Decimal>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub credit_limit: Option<Decimal>,
}

/// Input for recording a payment against the outstanding balance
#[derive(Debug, Deserialize)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
}

/// Row for customer queries
#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    credit_limit: Decimal,
    current_balance: Decimal,
    reputation_score: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted: bool,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            credit_limit: row.credit_limit,
            current_balance: row.current_balance,
            reputation_score: row.reputation_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted: row.deleted,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, business_id, name, phone, email, credit_limit, \
     current_balance, reputation_score, created_at, updated_at, deleted";

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a customer
    pub async fn create_customer(
        &self,
        business_id: Uuid,
        input: CreateCustomerInput,
    ) -> AppResult<Customer> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
            });
        }

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (business_id, name, phone, email, credit_limit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.credit_limit.unwrap_or(Decimal::ZERO))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Partial update of customer details. The balance is not updatable here;
    /// it only moves through sale settlement and payment recording.
    pub async fn update_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($1, name),
                phone = COALESCE($2, phone),
                email = COALESCE($3, email),
                credit_limit = COALESCE($4, credit_limit),
                updated_at = NOW()
            WHERE id = $5 AND business_id = $6 AND deleted = false
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.credit_limit)
        .bind(customer_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, business_id: Uuid, customer_id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND business_id = $2 AND deleted = false"
        ))
        .bind(customer_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// List customers for a business
    pub async fn list_customers(&self, business_id: Uuid) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE business_id = $1 AND deleted = false ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a payment against the customer's outstanding balance.
    ///
    /// The balance is decreased atomically and floored at zero; excess
    /// payment beyond the balance is absorbed. The UPDATE's row lock
    /// serializes against a concurrent credit sale completing for the same
    /// customer, so neither update can be lost.
    pub async fn record_payment(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
        amount: Decimal,
    ) -> AppResult<Customer> {
        validate_payment_amount(amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET current_balance = GREATEST(current_balance - $1, 0), updated_at = NOW()
            WHERE id = $2 AND business_id = $3 AND deleted = false
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(amount)
        .bind(customer_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// Soft-delete a customer
    pub async fn delete_customer(&self, business_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET deleted = true, updated_at = NOW() WHERE id = $1 AND business_id = $2 AND deleted = false",
        )
        .bind(customer_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        Ok(())
    }
}
