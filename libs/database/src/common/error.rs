/// Errors raised while establishing or probing a store connection
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    /// All connection attempts were exhausted
    #[error("Connection failed after {attempts} attempts: {last_error}")]
    ConnectionFailed { attempts: u32, last_error: String },

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
