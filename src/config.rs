use std::env;
use std::time::Duration;

/// Minimum length accepted for the session signing secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEV_JWT_SECRET: &str = "paydhan-development-secret-change-me-before-deploying";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Session cookie / JWT configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub ttl_hours: i64,
    pub secure_cookie: bool,
}

/// Google OAuth client settings. Absent when sign-in with Google is disabled.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub google: Option<GoogleOAuthConfig>,
    pub log_level: String,
    pub log_format: String,
    pub http_port: u16,
    pub environment: String,
    pub cors_origin: Option<String>,
    pub app_base_url: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = env_parse::<u32>("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let acquire_timeout_secs = env_parse::<u64>("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(30);
        let idle_timeout_secs = env_parse::<u64>("DATABASE_IDLE_TIMEOUT_SECS").unwrap_or(600); // 10 minutes
        let max_lifetime_secs = env_parse::<u64>("DATABASE_MAX_LIFETIME_SECS").unwrap_or(1800); // 30 minutes
        let test_before_acquire = env_parse::<bool>("DATABASE_TEST_BEFORE_ACQUIRE").unwrap_or(true);

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/paydhan".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl SessionConfig {
    /// Load session settings. Production refuses to start without a real secret.
    pub fn from_env(is_production: bool) -> Result<Self, String> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if is_production => {
                return Err("JWT_SECRET environment variable is required in production".to_string())
            }
            Err(_) => DEV_JWT_SECRET.to_string(),
        };

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        let ttl_hours = env_parse::<i64>("SESSION_TTL_HOURS").unwrap_or(24 * 7);
        if ttl_hours <= 0 {
            return Err("SESSION_TTL_HOURS must be greater than 0".to_string());
        }

        Ok(Self {
            jwt_secret,
            ttl_hours,
            secure_cookie: is_production,
        })
    }

    /// Session lifetime in seconds (cookie Max-Age)
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_hours * 3600
    }

    /// True when signing with the built-in development secret
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            ttl_hours: 24 * 7,
            secure_cookie: false,
        }
    }
}

impl GoogleOAuthConfig {
    /// All three variables must be present, otherwise Google sign-in stays disabled
    pub fn from_env() -> Option<Self> {
        let client_id = env::var("GOOGLE_CLIENT_ID").ok().filter(|s| !s.is_empty())?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET").ok().filter(|s| !s.is_empty())?;
        let redirect_uri = env::var("GOOGLE_REDIRECT_URI").ok().filter(|s| !s.is_empty())?;

        Some(Self {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        let http_port = env_parse::<u16>("HTTP_PORT").unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
                log_format, valid_log_formats
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        let environment = environment.to_lowercase();
        if !valid_environments.contains(&environment.as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let session = SessionConfig::from_env(environment == "production")?;

        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty());
        let app_base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", http_port));

        Ok(Self {
            database,
            session,
            google: GoogleOAuthConfig::from_env(),
            log_level: log_level.to_lowercase(),
            log_format: log_format.to_lowercase(),
            http_port,
            environment,
            cors_origin,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            session: SessionConfig::default(),
            google: None,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            http_port: 3000,
            environment: "development".to_string(),
            cors_origin: None,
            app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 3000);
        assert!(config.is_development());
        assert!(!config.is_production());
        assert!(config.google.is_none());
    }

    #[test]
    fn test_session_config_default() {
        let session = SessionConfig::default();
        assert!(session.jwt_secret.len() >= MIN_JWT_SECRET_LEN);
        assert_eq!(session.ttl_secs(), 7 * 24 * 3600);
        assert!(!session.secure_cookie);
        assert!(session.uses_dev_secret());

        let custom = SessionConfig {
            jwt_secret: "x".repeat(MIN_JWT_SECRET_LEN),
            ..SessionConfig::default()
        };
        assert!(!custom.uses_dev_secret());
    }
}
