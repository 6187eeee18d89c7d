use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How an expense amount is divided between participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Custom,
}

impl SplitType {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(SplitType::Equal),
            "custom" => Ok(SplitType::Custom),
            _ => Err(format!("Invalid split type: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Equal => "equal",
            SplitType::Custom => "custom",
        }
    }
}

/// A shared expense paid by one member of a group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupExpense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub paid_by: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub split_type: String,
    pub is_settled: bool,
    pub created_at: NaiveDateTime,
    pub settled_at: Option<NaiveDateTime>,
}

/// One member's share of a group expense
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupExpenseSplit {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub is_settled: bool,
    pub approval_requested: bool,
    pub settled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Split joined with the owing member's username, used in listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SplitView {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub amount: Decimal,
    pub is_settled: bool,
    pub approval_requested: bool,
    pub settled_at: Option<NaiveDateTime>,
}

/// A group expense share owed by a user, for personal reports
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwedShare {
    pub expense_id: Uuid,
    pub group_name: String,
    pub description: String,
    pub amount: Decimal,
    pub is_settled: bool,
    pub created_at: NaiveDateTime,
}
