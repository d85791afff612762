/// Configuration management for Blog Service
///
/// Loads configuration from environment variables (a `.env` file is honored
/// when present).
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Page cache configuration
    pub cache: CacheConfig,
    /// Identity token verification
    pub auth: AuthConfig,
    /// Cross-site request forgery protection
    pub csrf: CsrfConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before giving up
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Apply embedded migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    /// Lifetime of a cached global-feed page
    #[serde(default = "default_index_page_ttl_secs")]
    pub index_page_ttl_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// RS256 public key of the identity provider
    pub jwt_public_key_pem: Option<String>,
    /// HS256 shared secret, used when no public key is configured
    pub jwt_secret: Option<String>,
    /// Where unauthenticated mutations are sent
    pub login_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "jwt_public_key_pem",
                &self.jwt_public_key_pem.as_ref().map(|_| "[REDACTED]"),
            )
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("login_url", &self.login_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Origins allowed to send unsafe requests
    pub trusted_origins: Vec<String>,
}

// Default values
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_run_migrations() -> bool {
    true
}

fn default_index_page_ttl_secs() -> u64 {
    20
}

pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!("no .env file loaded: {}", err);
        }

        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or("BLOG_SERVICE_PORT", 8080)?,
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/yatube".to_string()),
            max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
            min_connections: parse_env_or("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            acquire_timeout_secs: parse_env_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                default_acquire_timeout_secs(),
            )?,
            run_migrations: parse_env_or("DATABASE_RUN_MIGRATIONS", default_run_migrations())?,
        };

        let cache = CacheConfig {
            redis_url: non_empty_env("REDIS_URL"),
            index_page_ttl_secs: parse_env_or(
                "INDEX_PAGE_CACHE_TTL_SECS",
                default_index_page_ttl_secs(),
            )?,
        };

        let auth = AuthConfig {
            jwt_public_key_pem: non_empty_env("JWT_PUBLIC_KEY_PEM"),
            jwt_secret: non_empty_env("JWT_SECRET"),
            login_url: std::env::var("LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string()),
        };
        if app.is_production() && auth.jwt_public_key_pem.is_none() && auth.jwt_secret.is_none() {
            bail!("JWT_PUBLIC_KEY_PEM or JWT_SECRET must be set in production");
        }

        let trusted_origins = parse_origins(
            &std::env::var("CSRF_TRUSTED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        );
        if app.is_production() && trusted_origins.iter().any(|o| o == "*") {
            bail!("CSRF_TRUSTED_ORIGINS cannot be '*' in production");
        }

        Ok(Config {
            app,
            database,
            cache,
            auth,
            csrf: CsrfConfig { trusted_origins },
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}='{}'", key, val)),
        Err(_) => Ok(default),
    }
}

/// Split a comma separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
