use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{TodoError, TodoResult};

/// A stored todo.
///
/// `created_at`/`updated_at` are maintained by the store and never leave the
/// process through REST or GraphQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, SimpleObject)]
pub struct Todo {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Due date, RFC 3339
    pub deadline: DateTime<Utc>,
    pub completed: bool,
    #[serde(skip)]
    #[graphql(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    #[graphql(skip)]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// The client-writable fields of this todo
    pub fn draft(&self) -> TodoDraft {
        TodoDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            deadline: self.deadline,
            completed: self.completed,
        }
    }
}

/// Client-writable fields, used for inserts and full replaces.
///
/// Missing `name`, `description` and `completed` decode to their zero values;
/// an empty name is then rejected by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct TodoDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl TodoDraft {
    pub fn new(name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            deadline,
            completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// The stored shape of this draft under `id`, without a read-back.
    /// Timestamps are approximated with the current time.
    pub fn into_todo(self, id: i32) -> Todo {
        let now = Utc::now();
        Todo {
            id,
            name: self.name,
            description: self.description,
            deadline: self.deadline,
            completed: self.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field invariants checked by every store before an insert
    pub fn check(&self) -> TodoResult<()> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .into_values()
                .flatten()
                .filter_map(|e| e.message.as_ref().map(ToString::to_string))
                .collect::<Vec<_>>()
                .join(", ");
            TodoError::Validation(message)
        })
    }
}
