use crate::auth::{hash_secret, verify_secret, GoogleProfile};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::repositories::UserRepository;
use crate::validation;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_FULL_NAME: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PinLoginRequest {
    pub username: String,
    pub pin: String,
}

/// Body of both quick account creation and profile completion
#[derive(Debug, Deserialize)]
pub struct UsernamePinRequest {
    pub username: String,
    pub pin: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPinRequest {
    pub current_pin: Option<String>,
    pub password: Option<String>,
    pub new_pin: String,
}

fn invalid_email_login() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

fn invalid_pin_login() -> AppError {
    AppError::Unauthorized("Invalid username or PIN".to_string())
}

/// Account creation and credential checks
pub struct AuthService {
    user_repo: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Email + password registration
    pub async fn signup(&self, req: &SignupRequest) -> AppResult<User> {
        let email = validation::email(&req.email)?;
        let password = validation::password(&req.password)?;
        let full_name = validation::optional_text(req.full_name.as_deref(), MAX_FULL_NAME, "Full name")?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let user = self
            .user_repo
            .create(&NewUser {
                email: Some(email),
                full_name,
                password_hash: Some(hash_secret(password)?),
                ..NewUser::default()
            })
            .await?;

        info!("Registered user {} via email", user.id);
        Ok(user)
    }

    /// Email + password sign-in. Unknown email and wrong password look the same.
    pub async fn signin(&self, req: &SigninRequest) -> AppResult<User> {
        let email = req.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_email_login)?;

        let hash = user.password_hash.as_deref().ok_or_else(invalid_email_login)?;
        if !verify_secret(&req.password, hash)? {
            warn!("Failed password sign-in for user {}", user.id);
            return Err(invalid_email_login());
        }

        info!("User {} signed in with password", user.id);
        Ok(user)
    }

    /// Username + PIN quick login
    pub async fn login(&self, req: &PinLoginRequest) -> AppResult<User> {
        let username = req.username.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or_else(invalid_pin_login)?;

        let hash = user.pin_hash.as_deref().ok_or_else(invalid_pin_login)?;
        if !verify_secret(&req.pin, hash)? {
            warn!("Failed PIN login for user {}", user.id);
            return Err(invalid_pin_login());
        }

        info!("User {} logged in with PIN", user.id);
        Ok(user)
    }

    /// Quick account with only a username and PIN
    pub async fn create_quick(&self, req: &UsernamePinRequest) -> AppResult<User> {
        let username = validation::username(&req.username)?;
        let pin = validation::pin(&req.pin)?;
        let full_name = validation::optional_text(req.full_name.as_deref(), MAX_FULL_NAME, "Full name")?;

        if self.user_repo.username_exists(&username).await? {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let user = self
            .user_repo
            .create(&NewUser {
                username: Some(username),
                full_name,
                pin_hash: Some(hash_secret(pin)?),
                ..NewUser::default()
            })
            .await?;

        info!("Created quick account {}", user.id);
        Ok(user)
    }

    /// Add username + PIN to an email or Google account
    pub async fn complete_profile(&self, user_id: Uuid, req: &UsernamePinRequest) -> AppResult<User> {
        let user = self.current_user(user_id).await?;
        if user.profile_complete() {
            return Err(AppError::Validation("Profile is already complete".to_string()));
        }

        let username = validation::username(&req.username)?;
        let pin = validation::pin(&req.pin)?;
        let full_name = validation::optional_text(req.full_name.as_deref(), MAX_FULL_NAME, "Full name")?;

        if let Some(owner) = self.user_repo.find_by_username(&username).await? {
            if owner.id != user_id {
                return Err(AppError::Conflict("Username is already taken".to_string()));
            }
        }

        let user = self
            .user_repo
            .complete_profile(user_id, &username, &hash_secret(pin)?, full_name.as_deref())
            .await?;

        info!("User {} completed profile as {}", user_id, username);
        Ok(user)
    }

    /// Change the PIN after proving identity with the current PIN or the password
    pub async fn reset_pin(&self, user_id: Uuid, req: &ResetPinRequest) -> AppResult<()> {
        let new_pin = validation::pin(&req.new_pin)?;
        let user = self.current_user(user_id).await?;

        let proven = match (req.current_pin.as_deref(), req.password.as_deref()) {
            (Some(current), _) => match user.pin_hash.as_deref() {
                Some(hash) => verify_secret(current, hash)?,
                None => false,
            },
            (None, Some(password)) => match user.password_hash.as_deref() {
                Some(hash) => verify_secret(password, hash)?,
                None => false,
            },
            (None, None) => {
                return Err(AppError::Validation(
                    "Provide your current PIN or password".to_string(),
                ))
            }
        };

        if !proven {
            warn!("Rejected PIN reset for user {}", user_id);
            return Err(AppError::Unauthorized("Current PIN or password is incorrect".to_string()));
        }

        self.user_repo.update_pin(user_id, &hash_secret(new_pin)?).await?;
        info!("User {} reset PIN", user_id);
        Ok(())
    }

    /// User behind a session. A session for a deleted user is treated as logged out.
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }

    pub async fn email_available(&self, raw: &str) -> AppResult<bool> {
        let email = validation::email(raw)?;
        Ok(!self.user_repo.email_exists(&email).await?)
    }

    pub async fn username_available(&self, raw: &str) -> AppResult<bool> {
        let username = validation::username(raw)?;
        Ok(!self.user_repo.username_exists(&username).await?)
    }

    /// Resolve a Google identity: by google id, then by verified email (linking), else a new user
    pub async fn google_sign_in(&self, profile: &GoogleProfile) -> AppResult<User> {
        if let Some(user) = self.user_repo.find_by_google_id(&profile.sub).await? {
            info!("User {} signed in with Google", user.id);
            return Ok(user);
        }

        // Only a verified address may link to or claim an account
        let email = profile.verified_email().ok_or_else(|| {
            warn!("Google account {} has no verified email", profile.sub);
            AppError::Unauthorized("Google account email is not verified".to_string())
        })?;

        if let Some(existing) = self.user_repo.find_by_email(&email).await? {
            let user = self
                .user_repo
                .link_google(existing.id, &profile.sub, profile.picture.as_deref())
                .await?
                .ok_or_else(|| {
                    warn!("User {} is already linked to another Google account", existing.id);
                    AppError::Conflict(
                        "This email is linked to a different Google account".to_string(),
                    )
                })?;
            info!("Linked Google account to user {}", user.id);
            return Ok(user);
        }

        let user = self
            .user_repo
            .create(&NewUser {
                email: Some(email),
                full_name: profile.name.clone(),
                avatar_url: profile.picture.clone(),
                google_id: Some(profile.sub.clone()),
                ..NewUser::default()
            })
            .await?;

        info!("Registered user {} via Google", user.id);
        Ok(user)
    }
}
