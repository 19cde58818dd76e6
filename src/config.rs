use std::env;

/// Fallback signing secret used outside production.
pub const LOCAL_JWT_SECRET: &str = "audit-portal-local-development-secret";

/// Name of the session cookie unless `AUTH_COOKIE_NAME` overrides it.
pub const DEFAULT_COOKIE_NAME: &str = "token";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` in local mode selects the in-memory store.
    pub db_url: Option<String>,
    // Upper bound for the Postgres pool.
    pub db_max_connections: u32,
    // Runtime environment marker. Controls log format and secret requirements.
    pub env: Env,
    // Secret key used to verify incoming session tokens (HS256).
    pub jwt_secret: String,
    // Cookie carrying the session token.
    pub cookie_name: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests. No database URL, so the
    /// in-memory document store is selected.
    fn default() -> Self {
        Self {
            db_url: None,
            db_max_connections: 5,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, so the
    /// service never starts with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(5);

        Self {
            db_url,
            db_max_connections,
            env,
            jwt_secret,
            cookie_name: env::var("AUTH_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}
