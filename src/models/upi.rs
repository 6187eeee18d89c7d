use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A UPI payment handle such as `name@bank`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UpiId {
    pub id: Uuid,
    pub user_id: Uuid,
    pub upi_id: String,
    pub display_name: Option<String>,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}
