use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Whether money came in or went out. Shared by categories and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(EntryType::Income),
            "expense" => Ok(EntryType::Expense),
            _ => Err(format!("Invalid type: {} (expected income or expense)", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }
}

impl From<EntryType> for String {
    fn from(t: EntryType) -> Self {
        t.as_str().to_string()
    }
}

/// User-defined category for personal entries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_type: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Category {
    pub fn type_enum(&self) -> Option<EntryType> {
        EntryType::from_str(&self.category_type).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_parsing() {
        assert_eq!(EntryType::from_str(" Income ").unwrap(), EntryType::Income);
        assert_eq!(EntryType::from_str("expense").unwrap(), EntryType::Expense);
        assert!(EntryType::from_str("transfer").is_err());
        assert_eq!(String::from(EntryType::Expense), "expense");
    }
}
