//! Google OAuth 2.0 authorization-code flow

use crate::config::GoogleOAuthConfig;
use crate::error::{AppError, AppResult};
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Cookie holding the anti-CSRF `state` between redirect and callback
pub const OAUTH_STATE_COOKIE: &str = "paydhan_oauth_state";

/// Identity returned by Google's userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    http: Client,
    token_endpoint: String,
    userinfo_endpoint: String,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: USERINFO_ENDPOINT.to_string(),
        }
    }

    /// Point the code exchange at different token and userinfo endpoints
    pub fn with_endpoints(mut self, token: &str, userinfo: &str) -> Self {
        self.token_endpoint = token.to_string();
        self.userinfo_endpoint = userinfo.to_string();
        self
    }

    /// Random value echoed back by Google in the callback
    pub fn new_state() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Consent screen URL for the given state
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            AUTHORIZE_ENDPOINT,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Trade the authorization code for a token, then fetch the profile
    pub async fn exchange_code(&self, code: &str) -> AppResult<GoogleProfile> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Google token endpoint returned {}", status);
            return Err(AppError::Unauthorized("Google sign-in failed".to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid Google token response: {e}")))?;

        let profile = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google userinfo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("Google userinfo rejected: {e}")))?
            .json::<GoogleProfile>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid Google profile: {e}")))?;

        Ok(profile)
    }
}

impl GoogleProfile {
    /// Email Google has verified for this account, normalised
    pub fn verified_email(&self) -> Option<String> {
        match self.email_verified {
            Some(true) => self.email.as_deref().map(|e| e.trim().to_lowercase()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:3000/api/auth/google/callback".into(),
        })
    }

    #[test]
    fn test_authorize_url_is_encoded() {
        let url = client().authorize_url("abc123");
        assert!(url.starts_with(AUTHORIZE_ENDPOINT));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn test_only_verified_email_is_trusted() {
        let profile: GoogleProfile = serde_json::from_str(
            r#"{"sub":"1","email":"Asha@Example.com","email_verified":true}"#,
        )
        .unwrap();
        assert_eq!(profile.verified_email().as_deref(), Some("asha@example.com"));

        let profile: GoogleProfile =
            serde_json::from_str(r#"{"sub":"1","email":"asha@example.com","email_verified":false}"#)
                .unwrap();
        assert_eq!(profile.verified_email(), None);

        let profile: GoogleProfile =
            serde_json::from_str(r#"{"sub":"1","email":"asha@example.com"}"#).unwrap();
        assert_eq!(profile.verified_email(), None);
    }

    #[test]
    fn test_state_is_random_hex() {
        let a = GoogleOAuthClient::new_state();
        let b = GoogleOAuthClient::new_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
