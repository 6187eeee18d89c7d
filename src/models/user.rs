use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User account. A user signs in with username/PIN, email/password or Google.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub pin_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// A profile is complete once the user can use the quick username/PIN login
    pub fn profile_complete(&self) -> bool {
        self.username.is_some() && self.pin_hash.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Name shown to other group members
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Someone".to_string())
    }

    /// Public profile returned by the API
    pub fn to_profile(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "full_name": self.full_name,
            "avatar_url": self.avatar_url,
            "has_pin": self.pin_hash.is_some(),
            "has_password": self.has_password(),
            "google_linked": self.google_id.is_some(),
            "profile_complete": self.profile_complete(),
            "created_at": self.created_at,
        })
    }
}

/// Fields needed to insert a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub pin_hash: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
}
