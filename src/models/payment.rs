use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Personal income or expense entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal, // NUMERIC(14, 2) in database
    pub payment_type: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields for inserting or fully replacing a payment
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub amount: Decimal,
    pub payment_type: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: NaiveDate,
}

/// Listing filters
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub payment_type: Option<String>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

/// Per-category total used by stats and reports
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryTotal {
    pub category: Option<String>,
    pub payment_type: String,
    pub total: Decimal,
}

/// Monthly income/expense totals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlyTotal {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}
