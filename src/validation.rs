//! Input normalization and validation shared by the HTTP handlers.
//!
//! Every function returns the normalized value or `AppError::Validation`
//! with a message that is safe to show to the client.

use crate::error::{AppError, AppResult};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidateEmail;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const MAX_EMAIL_LEN: usize = 254;

/// Upper bound (exclusive) for any money amount
pub const MAX_AMOUNT: i64 = 10_000_000_000;

fn upi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._-]{2,256}@[a-zA-Z][a-zA-Z0-9]{2,64}$").expect("valid UPI regex")
    })
}

fn colour_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid colour regex"))
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// 3-30 characters of letters, digits or underscore; returned lowercase
pub fn username(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(invalid(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("Username may only contain letters, numbers and underscores"));
    }
    Ok(name.to_lowercase())
}

/// Exactly four ASCII digits
pub fn pin(raw: &str) -> AppResult<&str> {
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(raw)
    } else {
        Err(invalid("PIN must be exactly 4 digits"))
    }
}

pub fn password(raw: &str) -> AppResult<&str> {
    let len = raw.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(invalid(format!(
            "Password must be between {} and {} characters",
            PASSWORD_MIN, PASSWORD_MAX
        )));
    }
    Ok(raw)
}

/// Trimmed, lowercased email address
pub fn email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
        return Err(invalid("Invalid email address"));
    }
    Ok(email)
}

/// Trim, drop control characters and enforce `1..=max` characters
pub fn sanitize_text(raw: &str, max: usize, field: &str) -> AppResult<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();

    if cleaned.is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    if cleaned.chars().count() > max {
        return Err(invalid(format!("{} must be at most {} characters", field, max)));
    }
    Ok(cleaned)
}

/// Like `sanitize_text`, but blank input becomes `None`
pub fn optional_text(raw: Option<&str>, max: usize, field: &str) -> AppResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => sanitize_text(s, max, field).map(Some),
    }
}

/// Positive money amount with at most two decimal places
pub fn amount(value: Decimal) -> AppResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(invalid("Amount must be greater than zero"));
    }
    if value.normalize().scale() > 2 {
        return Err(invalid("Amount can have at most 2 decimal places"));
    }
    if value >= Decimal::from(MAX_AMOUNT) {
        return Err(invalid("Amount is too large"));
    }
    Ok(value.round_dp(2))
}

/// UPI handle such as `name@bank`
pub fn upi_id(raw: &str) -> AppResult<String> {
    let id = raw.trim();
    if !upi_regex().is_match(id) {
        return Err(invalid("Invalid UPI ID format"));
    }
    Ok(id.to_string())
}

/// `#RRGGBB`
pub fn colour(raw: &str) -> AppResult<String> {
    let c = raw.trim();
    if !colour_regex().is_match(c) {
        return Err(invalid("Color must be a hex value like #1A2B3C"));
    }
    Ok(c.to_uppercase())
}

/// Clamp an optional page size into `1..=max`
pub fn limit(value: Option<i64>, default: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_username_rules() {
        assert_eq!(username("  Asha_01 ").unwrap(), "asha_01");
        assert!(username("ab").is_err());
        assert!(username(&"a".repeat(31)).is_err());
        assert!(username("asha rao").is_err());
        assert!(username("asha-rao").is_err());
    }

    #[test]
    fn test_pin_rules() {
        assert!(pin("0420").is_ok());
        assert!(pin("123").is_err());
        assert!(pin("12345").is_err());
        assert!(pin("12a4").is_err());
        assert!(pin("١٢٣٤").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
        assert!(password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_email_normalized() {
        assert_eq!(email(" Asha@Example.COM ").unwrap(), "asha@example.com");
        assert!(email("not-an-email").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  hi\u{0007} there ", 20, "Message").unwrap(), "hi there");
        assert!(sanitize_text("   ", 20, "Message").is_err());
        assert!(sanitize_text("abcdef", 5, "Message").is_err());
        assert_eq!(optional_text(Some("  "), 5, "Note").unwrap(), None);
    }

    #[test]
    fn test_amount_rules() {
        assert_eq!(amount(Decimal::from_str("10.5").unwrap()).unwrap(), Decimal::from_str("10.50").unwrap());
        assert!(amount(Decimal::ZERO).is_err());
        assert!(amount(Decimal::from_str("-1").unwrap()).is_err());
        assert!(amount(Decimal::from_str("1.005").unwrap()).is_err());
        assert!(amount(Decimal::from_str("1.500").unwrap()).is_ok());
        assert!(amount(Decimal::from(MAX_AMOUNT)).is_err());
    }

    #[test]
    fn test_upi_id_format() {
        assert!(upi_id("asha.rao@okaxis").is_ok());
        assert!(upi_id("9876543210@ybl").is_ok());
        assert!(upi_id("asha@1bank").is_err());
        assert!(upi_id("a@ok").is_err());
        assert!(upi_id("no-at-sign").is_err());
    }

    #[test]
    fn test_colour() {
        assert_eq!(colour("#a1b2c3").unwrap(), "#A1B2C3");
        assert!(colour("a1b2c3").is_err());
        assert!(colour("#abc").is_err());
    }

    #[test]
    fn test_limit_clamps() {
        assert_eq!(limit(None, 50, 100), 50);
        assert_eq!(limit(Some(0), 50, 100), 1);
        assert_eq!(limit(Some(1000), 50, 100), 100);
    }
}
