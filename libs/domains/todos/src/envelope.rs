use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::TodoError;

/// `{error, message}` body returned by REST writes and REST failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    pub error: bool,
    pub message: String,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }
}

impl From<&TodoError> for Envelope {
    fn from(err: &TodoError) -> Self {
        Self::failure(err.public_message())
    }
}
