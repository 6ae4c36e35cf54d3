//! Runtime configuration, read once from the environment at startup.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

pub const DEFAULT_SESSION_SECRET: &str = "fallback-secret-key";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "" => Environment::Development,
            "production" | "prod" => Environment::Production,
            _ => Environment::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: i64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_url: Option<String>,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// `None` lets startup pick postgres when a pool is available.
    pub session_backend: Option<SessionBackend>,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_password_hash: Option<String>,
    pub upload_dir: PathBuf,
    pub max_body_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub security_headers: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let environment = Environment::parse(&env::var("ENVIRONMENT").unwrap_or_default());

        let session_backend = match env::var("SESSION_STORE").ok().as_deref() {
            Some("memory") => Some(SessionBackend::Memory),
            Some("postgres") => Some(SessionBackend::Postgres),
            Some(other) => {
                tracing::warn!("Unknown SESSION_STORE '{}', choosing automatically", other);
                None
            }
            None => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000),
            environment,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string()),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24),
            session_backend,
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            admin_password_hash: env::var("ADMIN_HASH_PASSWORD").ok().filter(|s| !s.is_empty()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 10 * 1024 * 1024),
            rate_limit: RateLimitConfig {
                enabled: parse_or("RATE_LIMIT_ENABLED", true),
                max_requests: parse_or("RATE_LIMIT_MAX", 100),
                window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 15 * 60),
            },
            security_headers: parse_or("SECURITY_HEADERS", true),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn uses_default_credentials(&self) -> bool {
        self.admin_email == DEFAULT_ADMIN_EMAIL
            || (self.admin_password_hash.is_none() && self.admin_password == DEFAULT_ADMIN_PASSWORD)
    }

    /// Checks that must hold before serving traffic in production.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production()
            && (self.session_secret.is_empty() || self.session_secret == DEFAULT_SESSION_SECRET)
        {
            return Err(
                "SESSION_SECRET must be set to a secure, unique value in production".to_string(),
            );
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(format!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: Environment::Development,
            database_url: None,
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
            session_backend: None,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            admin_password_hash: None,
            upload_dir: PathBuf::from("uploads"),
            max_body_bytes: 10 * 1024 * 1024,
            rate_limit: RateLimitConfig {
                enabled: true,
                max_requests: 100,
                window_secs: 15 * 60,
            },
            security_headers: true,
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {} value '{}': {}, using default", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("Development"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Other);
    }

    #[test]
    fn test_default_config_is_development() {
        let config = Config::default();
        assert!(config.is_development());
        assert!(config.uses_default_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = Config {
            environment: Environment::Production,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            environment: Environment::Production,
            session_secret: "a-real-secret-value".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_ttl_must_be_in_range() {
        for hours in [0, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
            let config = Config {
                session_ttl_hours: hours,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "{}", hours);
        }
        let config = Config {
            session_ttl_hours: MAX_SESSION_TTL_HOURS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hash_overrides_default_password_check() {
        let config = Config {
            admin_email: "owner@site.dev".to_string(),
            admin_password_hash: Some("$2b$12$abc".to_string()),
            ..Config::default()
        };
        assert!(!config.uses_default_credentials());
    }
}
