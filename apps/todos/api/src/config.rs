//! Configuration for the Todos API

use axum::http::HeaderValue;
use core_config::{FromEnv, env_or_default, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use eyre::WrapErr;
use std::time::Duration;

pub use core_config::Environment;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    /// REST + GraphQL listener
    pub http: ServerConfig,
    pub grpc: ServerConfig,
    pub database: PostgresConfig,
    pub cors_origins: Vec<HeaderValue>,
    pub shutdown_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let cors_origins = parse_origins(&env_or_default(
            "CORS_ALLOWED_ORIGIN",
            "http://localhost:3000",
        ))?;

        Ok(Self {
            environment: Environment::from_env(),
            http: ServerConfig::from_env()?,
            grpc: ServerConfig::grpc_from_env()?,
            database: PostgresConfig::from_env().wrap_err("invalid database settings")?,
            cors_origins,
            shutdown_timeout: Duration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECS", "30")?),
        })
    }
}

/// Comma-separated list of allowed origins
fn parse_origins(raw: &str) -> eyre::Result<Vec<HeaderValue>> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>()
                .wrap_err_with(|| format!("invalid CORS origin '{s}'"))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    eyre::ensure!(!origins.is_empty(), "CORS_ALLOWED_ORIGIN cannot be empty");
    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("http://localhost:3000, https://todos.example.com,").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "https://todos.example.com");

        assert!(parse_origins(" , ").is_err());
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://todo@localhost/todos")),
                ("HTTP_PORT", None),
                ("GRPC_PORT", None),
                ("CORS_ALLOWED_ORIGIN", None),
                ("SHUTDOWN_TIMEOUT_SECS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.http.port, 8080);
                assert_eq!(config.grpc.port, 9000);
                assert_eq!(config.cors_origins, ["http://localhost:3000"]);
                assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn test_from_env_requires_database_settings() {
        temp_env::with_vars(
            [("DATABASE_URL", None::<&str>), ("DB_USER", None)],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(format!("{err:?}").contains("DB_USER"));
            },
        );
    }
}
