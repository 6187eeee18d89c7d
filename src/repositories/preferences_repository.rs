use crate::error::RepoResult;
use crate::models::UserPreferences;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PreferencesRepository {
    pool: PgPool,
}

impl PreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: Uuid) -> RepoResult<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            SELECT user_id, currency, theme, notifications_enabled, updated_at
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prefs)
    }

    pub async fn upsert(&self, prefs: &UserPreferences) -> RepoResult<UserPreferences> {
        let saved = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences (user_id, currency, theme, notifications_enabled)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET currency = EXCLUDED.currency,
                theme = EXCLUDED.theme,
                notifications_enabled = EXCLUDED.notifications_enabled,
                updated_at = NOW()
            RETURNING user_id, currency, theme, notifications_enabled, updated_at
            "#,
        )
        .bind(prefs.user_id)
        .bind(&prefs.currency)
        .bind(&prefs.theme)
        .bind(prefs.notifications_enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}
