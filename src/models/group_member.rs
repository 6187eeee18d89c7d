use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Member role in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl From<String> for MemberRole {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(MemberRole::Member)
    }
}

impl From<MemberRole> for String {
    fn from(role: MemberRole) -> Self {
        role.as_str().to_string()
    }
}

/// A user's membership in a group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: String, // Stored as TEXT in DB, use MemberRole enum for type safety
    pub joined_at: NaiveDateTime,
}

impl GroupMember {
    /// Get the role as an enum
    pub fn role_enum(&self) -> MemberRole {
        MemberRole::from_str(&self.role).unwrap_or(MemberRole::Member)
    }

    /// Check if member is an admin
    pub fn is_admin(&self) -> bool {
        self.role_enum() == MemberRole::Admin
    }
}

/// Membership joined with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub joined_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        assert_eq!(MemberRole::from_str("ADMIN").unwrap(), MemberRole::Admin);
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert!(MemberRole::from_str("owner").is_err());
        assert_eq!(MemberRole::from("owner".to_string()), MemberRole::Member);
    }
}
