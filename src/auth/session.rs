use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "paydhan_session";

/// JWT claims stored in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.ttl_secs(),
            secure_cookie: config.secure_cookie,
        }
    }

    /// Sign a token for `user_id` valid for the configured TTL
    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id,
            exp: now + self.ttl_secs,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Message(format!("Failed to sign session token: {e}")))
    }

    /// Decode and validate a token. Any failure is reported as 401.
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => debug!("Session token expired"),
                    other => debug!("Rejected session token: {:?}", other),
                }
                AppError::Unauthorized("Unauthorized".to_string())
            })
    }

    /// Cookie holding a freshly issued token
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure_cookie)
            .max_age(time::Duration::seconds(self.ttl_secs))
            .build()
    }

    /// Expired cookie that makes the browser drop the session
    pub fn clear_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure_cookie)
            .max_age(time::Duration::ZERO)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(&SessionConfig::default())
    }

    #[test]
    fn test_issue_and_verify() {
        let sessions = manager();
        let user_id = Uuid::new_v4();
        let token = sessions.issue(user_id).unwrap();
        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let other = SessionManager::new(&SessionConfig {
            jwt_secret: "another-secret-that-is-at-least-32-chars".to_string(),
            ..SessionConfig::default()
        });
        let token = other.issue(Uuid::new_v4()).unwrap();
        let err = manager().verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let sessions = manager();
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &sessions.encoding_key).unwrap();
        assert!(sessions.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(manager().verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_cookie_flags() {
        let sessions = manager();
        let cookie = sessions.session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(7 * 24 * 3600)));

        let cleared = sessions.clear_cookie();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
    }
}
