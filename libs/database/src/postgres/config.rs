use sea_orm::ConnectOptions;
use std::time::Duration;
use tracing::log::LevelFilter;

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};

/// Pool and connection settings for the todo store
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    /// Full connection URL, credentials included
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    /// How long a caller may wait for a pooled connection
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub sqlx_logging: bool,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Builds the URL from discrete parts, as used by `DB_*` variables.
    pub fn from_parts(
        user: &str,
        password: &str,
        host: &str,
        port: u16,
        database: &str,
        ssl_mode: &str,
    ) -> Self {
        let credentials = if password.is_empty() {
            user.to_string()
        } else {
            format!("{user}:{password}")
        };
        Self::new(format!(
            "postgres://{credentials}@{host}:{port}/{database}?sslmode={ssl_mode}"
        ))
    }

    /// URL with the password masked, for logs
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, location)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{location}"),
            None => self.url.clone(),
        }
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(&self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .sqlx_logging(self.sqlx_logging)
            .sqlx_logging_level(LevelFilter::Debug);
        opt
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 25,
            min_connections: 1,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 3,
            idle_timeout_secs: 300,
            sqlx_logging: false,
        }
    }
}

/// Environment variables:
/// - `DATABASE_URL` - full URL; when set the `DB_*` parts below are ignored
/// - `DB_USER` (required), `DB_PASSWD` (default: empty)
/// - `DB_HOST` (default: localhost), `DB_PORT` (default: 5432)
/// - `DB_NAME` (default: todos), `SSL_MODE` (default: disable)
/// - `DB_MAX_CONNECTIONS` (25), `DB_MIN_CONNECTIONS` (1)
/// - `DB_CONNECT_TIMEOUT_SECS` (5), `DB_ACQUIRE_TIMEOUT_SECS` (3)
/// - `DB_IDLE_TIMEOUT_SECS` (300), `DB_SQLX_LOGGING` (false)
#[cfg(feature = "config")]
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Self::new(url),
            _ => Self::from_parts(
                &env_required("DB_USER")?,
                &env_or_default("DB_PASSWD", ""),
                &env_or_default("DB_HOST", "localhost"),
                env_parse("DB_PORT", "5432")?,
                &env_or_default("DB_NAME", "todos"),
                &env_or_default("SSL_MODE", "disable"),
            ),
        };

        Ok(Self {
            max_connections: env_parse("DB_MAX_CONNECTIONS", "25")?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", "1")?,
            connect_timeout_secs: env_parse("DB_CONNECT_TIMEOUT_SECS", "5")?,
            acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", "3")?,
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS", "300")?,
            sqlx_logging: env_parse("DB_SQLX_LOGGING", "false")?,
            ..base
        })
    }
}
