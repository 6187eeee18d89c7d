use crate::error::RepoResult;
use crate::models::{NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, pin_hash, password_hash, \
                            google_id, created_at, updated_at";

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, new_user: &NewUser) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, avatar_url, pin_hash, password_hash, google_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.avatar_url)
        .bind(&new_user.pin_hash)
        .bind(&new_user.password_hash)
        .bind(&new_user.google_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by (lowercased) email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by (lowercased) username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by Google account subject
    pub async fn find_by_google_id(&self, google_id: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Set username, PIN and (optionally) full name for an existing account
    pub async fn complete_profile(
        &self,
        id: Uuid,
        username: &str,
        pin_hash: &str,
        full_name: Option<&str>,
    ) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $2, pin_hash = $3, full_name = COALESCE($4, full_name), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(username)
        .bind(pin_hash)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the stored PIN hash
    pub async fn update_pin(&self, id: Uuid, pin_hash: &str) -> RepoResult<bool> {
        let rows_affected =
            sqlx::query("UPDATE users SET pin_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(pin_hash)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Attach a Google account to an existing user.
    /// Returns None when the user is already linked to a different Google account.
    pub async fn link_google(
        &self,
        id: Uuid,
        google_id: &str,
        avatar_url: Option<&str>,
    ) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET google_id = $2, avatar_url = COALESCE(avatar_url, $3), updated_at = NOW()
            WHERE id = $1 AND (google_id IS NULL OR google_id = $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(google_id)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
