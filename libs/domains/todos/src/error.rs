use thiserror::Error;

/// Failure kinds every Storage Port implementation reports.
///
/// Each protocol adapter maps these onto its own status vocabulary; none of
/// them adds kinds of its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("todo {0} not found")]
    NotFound(i32),

    #[error("invalid todo: {0}")]
    Validation(String),

    /// The call exceeded its deadline; safe for the caller to retry.
    #[error("{0} timed out")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl TodoError {
    /// Stable machine-readable code, used in GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            TodoError::NotFound(_) => "NOT_FOUND",
            TodoError::Validation(_) => "VALIDATION",
            TodoError::Timeout(_) => "TIMEOUT",
            TodoError::Internal(_) => "INTERNAL",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TodoError::Timeout(_))
    }

    /// Message safe to show clients. Store details of internal failures stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            TodoError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}
