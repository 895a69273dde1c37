use sea_orm::{Database, DatabaseConnection, DbErr};
use tracing::info;

use super::PostgresConfig;
use crate::common::{DatabaseError, RetryConfig, retry_with_backoff};

/// Open a pool with the given settings, single attempt
pub async fn connect(config: PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    let target = config.redacted_url();
    let db = Database::connect(config.into_connect_options()).await?;
    info!(url = %target, "connected to PostgreSQL");
    Ok(db)
}

/// Open a pool, retrying with exponential backoff while the store comes up.
///
/// ```ignore
/// let db = connect_with_retry(config, Some(RetryConfig::new().with_max_retries(10))).await?;
/// ```
pub async fn connect_with_retry(
    config: PostgresConfig,
    retry: Option<RetryConfig>,
) -> Result<DatabaseConnection, DatabaseError> {
    let retry = retry.unwrap_or_default();

    retry_with_backoff(|| connect(config.clone()), &retry)
        .await
        .map_err(|(attempts, e)| DatabaseError::ConnectionFailed {
            attempts,
            last_error: e.to_string(),
        })
}
