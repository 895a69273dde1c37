use async_trait::async_trait;
use std::sync::Arc;

use crate::error::TodoResult;
use crate::models::{Todo, TodoDraft};

/// Storage Port: the six operations any todo store must provide.
///
/// Every call is independent and atomic for a single row. Implementations
/// bound each call by a deadline and report [`TodoError::Timeout`] when it
/// passes.
///
/// [`TodoError::Timeout`]: crate::TodoError::Timeout
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos ordered by ascending deadline, optionally only those whose
    /// `completed` flag matches.
    async fn select_todos(&self, completed: Option<bool>) -> TodoResult<Vec<Todo>>;

    async fn select_todo(&self, id: i32) -> TodoResult<Todo>;

    /// Stores a new todo and returns its id. Rejects an empty name.
    async fn insert_todo(&self, draft: TodoDraft) -> TodoResult<i32>;

    /// Replaces every writable field of todo `id`.
    async fn update_todo(&self, id: i32, draft: TodoDraft) -> TodoResult<()>;

    async fn update_todo_completed(&self, id: i32, completed: bool) -> TodoResult<()>;

    async fn delete_todo(&self, id: i32) -> TodoResult<()>;
}

/// Handle the protocol adapters are constructed with
pub type SharedRepository = Arc<dyn TodoRepository>;
