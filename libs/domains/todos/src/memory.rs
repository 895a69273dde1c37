use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{TodoError, TodoResult};
use crate::models::{Todo, TodoDraft};
use crate::repository::TodoRepository;

/// Storage Port operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SelectTodos,
    SelectTodo,
    InsertTodo,
    UpdateTodo,
    UpdateTodoCompleted,
    DeleteTodo,
}

/// Which calls of an operation an injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Any,
    /// Calls addressing this id
    Id(i32),
    /// `select_todos` calls filtered on this `completed` value
    Completed(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Timeout,
    Internal,
}

#[derive(Debug, Clone)]
struct Failure {
    operation: Operation,
    target: Target,
    kind: FailureKind,
}

/// In-process store used by tests and local experiments.
///
/// Canned failures are configured up front:
///
/// ```
/// use domain_todos::memory::{FailureKind, InMemoryTodoRepository, Operation, Target};
///
/// let repo = InMemoryTodoRepository::new()
///     .fail_on(Operation::SelectTodo, Target::Id(2), FailureKind::Internal);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<BTreeMap<i32, Todo>>>,
    next_id: Arc<AtomicI32>,
    failures: Arc<Vec<Failure>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make matching calls of `operation` fail with `kind` instead of touching the data.
    pub fn fail_on(mut self, operation: Operation, target: Target, kind: FailureKind) -> Self {
        Arc::make_mut(&mut self.failures).push(Failure {
            operation,
            target,
            kind,
        });
        self
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }

    fn injected(
        &self,
        operation: Operation,
        id: Option<i32>,
        completed: Option<bool>,
    ) -> TodoResult<()> {
        let hit = self.failures.iter().find(|f| {
            f.operation == operation
                && match f.target {
                    Target::Any => true,
                    Target::Id(target) => id == Some(target),
                    Target::Completed(target) => completed == Some(target),
                }
        });

        match hit.map(|f| f.kind) {
            None => Ok(()),
            Some(kind) => {
                debug!(?operation, ?kind, "returning injected failure");
                Err(match kind {
                    FailureKind::NotFound => TodoError::NotFound(id.unwrap_or_default()),
                    FailureKind::Timeout => TodoError::Timeout(format!("{operation:?}")),
                    FailureKind::Internal => TodoError::Internal("injected failure".into()),
                })
            }
        }
    }
}

/// Current time, nudged forward so `updated_at` strictly increases per row.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn select_todos(&self, completed: Option<bool>) -> TodoResult<Vec<Todo>> {
        self.injected(Operation::SelectTodos, None, completed)?;

        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|t| completed.is_none_or(|c| t.completed == c))
            .cloned()
            .collect();
        // Stable: equal deadlines stay in id order.
        todos.sort_by_key(|t| t.deadline);
        Ok(todos)
    }

    async fn select_todo(&self, id: i32) -> TodoResult<Todo> {
        self.injected(Operation::SelectTodo, Some(id), None)?;

        self.todos
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TodoError::NotFound(id))
    }

    async fn insert_todo(&self, draft: TodoDraft) -> TodoResult<i32> {
        self.injected(Operation::InsertTodo, None, None)?;
        draft.check()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let todo = Todo {
            id,
            name: draft.name,
            description: draft.description,
            deadline: draft.deadline,
            completed: draft.completed,
            created_at: now,
            updated_at: now,
        };
        self.todos.write().await.insert(id, todo);
        Ok(id)
    }

    async fn update_todo(&self, id: i32, draft: TodoDraft) -> TodoResult<()> {
        self.injected(Operation::UpdateTodo, Some(id), None)?;

        let mut todos = self.todos.write().await;
        let todo = todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        todo.name = draft.name;
        todo.description = draft.description;
        todo.deadline = draft.deadline;
        todo.completed = draft.completed;
        todo.updated_at = touch(todo.updated_at);
        Ok(())
    }

    async fn update_todo_completed(&self, id: i32, completed: bool) -> TodoResult<()> {
        self.injected(Operation::UpdateTodoCompleted, Some(id), None)?;

        let mut todos = self.todos.write().await;
        let todo = todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        todo.completed = completed;
        todo.updated_at = touch(todo.updated_at);
        Ok(())
    }

    async fn delete_todo(&self, id: i32) -> TodoResult<()> {
        self.injected(Operation::DeleteTodo, Some(id), None)?;

        self.todos
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(TodoError::NotFound(id))
    }
}
