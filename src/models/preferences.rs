use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "INR";
pub const THEMES: [&str; 3] = ["light", "dark", "system"];

/// Per-user display settings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub currency: String,
    pub theme: String,
    pub notifications_enabled: bool,
    pub updated_at: NaiveDateTime,
}

impl UserPreferences {
    /// Defaults used before a user saves anything
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            currency: DEFAULT_CURRENCY.to_string(),
            theme: "system".to_string(),
            notifications_enabled: true,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
