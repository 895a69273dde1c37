use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Select, UpdateMany,
};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::{
    entity,
    error::{TodoError, TodoResult},
    models::{Todo, TodoDraft},
    repository::TodoRepository,
};

/// Deadline applied to every store call unless overridden
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Relational adapter over a pooled SeaORM connection
#[derive(Clone)]
pub struct PgTodoRepository {
    db: DatabaseConnection,
    call_timeout: Duration,
}

impl PgTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = TodoResult<T>>,
    ) -> TodoResult<T> {
        bounded(self.call_timeout, operation, call).await
    }

    async fn apply(&self, id: i32, changes: entity::ActiveModel) -> TodoResult<()> {
        let result = update_query(id, changes)
            .exec(&self.db)
            .await
            .map_err(store_error(Some(id)))?;
        if result.rows_affected == 0 {
            return Err(TodoError::NotFound(id));
        }
        Ok(())
    }
}

/// Runs `call` under `limit`. On expiry the call is dropped, which cancels the
/// in-flight query and hands its connection back to the pool.
pub(crate) async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = TodoResult<T>>,
) -> TodoResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "store call timed out"
            );
            Err(TodoError::Timeout(operation.to_string()))
        }
    }
}

/// `SELECT .. FROM todo [WHERE completed = $1] ORDER BY deadline, id`
pub(crate) fn list_query(completed: Option<bool>) -> Select<entity::Entity> {
    let mut query = entity::Entity::find();
    if let Some(completed) = completed {
        query = query.filter(entity::Column::Completed.eq(completed));
    }
    query
        .order_by_asc(entity::Column::Deadline)
        .order_by_asc(entity::Column::Id)
}

/// `UPDATE todo SET <changes>, updated_at = .. WHERE id = $n`
///
/// `updated_at` moves strictly forward even when two writes land in the same
/// microsecond or the clock steps back.
pub(crate) fn update_query(id: i32, changes: entity::ActiveModel) -> UpdateMany<entity::Entity> {
    entity::Entity::update_many()
        .set(changes)
        .col_expr(
            entity::Column::UpdatedAt,
            Expr::cust(r#"GREATEST(now(), "updated_at" + interval '1 microsecond')"#),
        )
        .filter(entity::Column::Id.eq(id))
}

fn store_error(id: Option<i32>) -> impl FnOnce(DbErr) -> TodoError {
    move |err| match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
            TodoError::NotFound(id.unwrap_or_default())
        }
        DbErr::ConnectionAcquire(cause) => {
            warn!(error = %cause, "no pooled connection available");
            TodoError::Timeout(format!("acquiring a connection ({cause})"))
        }
        other => {
            error!(error = %other, todo_id = ?id, "store call failed");
            TodoError::Internal(other.to_string())
        }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    #[instrument(skip(self))]
    async fn select_todos(&self, completed: Option<bool>) -> TodoResult<Vec<Todo>> {
        self.bounded("select_todos", async {
            let rows = list_query(completed)
                .all(&self.db)
                .await
                .map_err(store_error(None))?;
            Ok(rows.into_iter().map(Todo::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn select_todo(&self, id: i32) -> TodoResult<Todo> {
        self.bounded("select_todo", async {
            entity::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(store_error(Some(id)))?
                .map(Todo::from)
                .ok_or(TodoError::NotFound(id))
        })
        .await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn insert_todo(&self, draft: TodoDraft) -> TodoResult<i32> {
        draft.check()?;

        self.bounded("insert_todo", async {
            let model = entity::ActiveModel::from(draft)
                .insert(&self.db)
                .await
                .map_err(store_error(None))?;
            info!(todo_id = model.id, "todo inserted");
            Ok(model.id)
        })
        .await
    }

    #[instrument(skip(self, draft))]
    async fn update_todo(&self, id: i32, draft: TodoDraft) -> TodoResult<()> {
        let changes = entity::ActiveModel {
            id: NotSet,
            name: Set(draft.name),
            description: Set(draft.description),
            deadline: Set(draft.deadline.into()),
            completed: Set(draft.completed),
            created_at: NotSet,
            updated_at: NotSet,
        };
        self.bounded("update_todo", self.apply(id, changes)).await
    }

    #[instrument(skip(self))]
    async fn update_todo_completed(&self, id: i32, completed: bool) -> TodoResult<()> {
        let changes = entity::ActiveModel {
            id: NotSet,
            name: NotSet,
            description: NotSet,
            deadline: NotSet,
            completed: Set(completed),
            created_at: NotSet,
            updated_at: NotSet,
        };
        self.bounded("update_todo_completed", self.apply(id, changes))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_todo(&self, id: i32) -> TodoResult<()> {
        self.bounded("delete_todo", async {
            let result = entity::Entity::delete_by_id(id)
                .exec(&self.db)
                .await
                .map_err(store_error(Some(id)))?;
            if result.rows_affected == 0 {
                return Err(TodoError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}
