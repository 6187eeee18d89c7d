use crate::error::{AppError, AppResult};
use crate::models::preferences::THEMES;
use crate::models::UserPreferences;
use crate::repositories::PreferencesRepository;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub currency: Option<String>,
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
}

/// ISO 4217 style: three ASCII letters, returned uppercase
fn currency_code(raw: &str) -> AppResult<String> {
    let code = raw.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(
            "Currency must be a 3-letter ISO code".to_string(),
        ));
    }
    Ok(code.to_uppercase())
}

fn theme(raw: &str) -> AppResult<String> {
    let theme = raw.trim().to_lowercase();
    if !THEMES.contains(&theme.as_str()) {
        return Err(AppError::Validation(format!(
            "Theme must be one of: {}",
            THEMES.join(", ")
        )));
    }
    Ok(theme)
}

pub struct PreferencesService {
    preferences_repo: Arc<PreferencesRepository>,
}

impl PreferencesService {
    pub fn new(preferences_repo: Arc<PreferencesRepository>) -> Self {
        Self { preferences_repo }
    }

    /// Stored preferences, or defaults if the user never saved any
    pub async fn get(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        Ok(self
            .preferences_repo
            .find(user_id)
            .await?
            .unwrap_or_else(|| UserPreferences::defaults_for(user_id)))
    }

    pub async fn update(&self, user_id: Uuid, req: &UpdatePreferencesRequest) -> AppResult<UserPreferences> {
        let mut prefs = self.get(user_id).await?;
        if let Some(currency) = req.currency.as_deref() {
            prefs.currency = currency_code(currency)?;
        }
        if let Some(t) = req.theme.as_deref() {
            prefs.theme = theme(t)?;
        }
        if let Some(enabled) = req.notifications_enabled {
            prefs.notifications_enabled = enabled;
        }

        let saved = self.preferences_repo.upsert(&prefs).await?;
        info!("Updated preferences for {}", user_id);
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code() {
        assert_eq!(currency_code(" usd ").unwrap(), "USD");
        assert!(currency_code("RUPEE").is_err());
        assert!(currency_code("U5D").is_err());
    }

    #[test]
    fn test_theme() {
        assert_eq!(theme("Dark").unwrap(), "dark");
        assert!(theme("neon").is_err());
    }
}
