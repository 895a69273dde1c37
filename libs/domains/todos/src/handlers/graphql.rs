use async_graphql::{
    Context, EmptySubscription, Error, ErrorExtensions, Object, Result, Schema,
    http::GraphiQLSource,
};
use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::TodoError;
use crate::models::{Todo, TodoDraft};
use crate::repository::SharedRepository;

pub type TodoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

impl ErrorExtensions for TodoError {
    fn extend(&self) -> Error {
        Error::new(self.public_message()).extend_with(|_, extensions| {
            extensions.set("code", self.code());
        })
    }
}

fn repository<'a>(ctx: &Context<'a>) -> Result<&'a SharedRepository> {
    ctx.data::<SharedRepository>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Todos ordered by deadline, optionally filtered on completion
    async fn get_todos(&self, ctx: &Context<'_>, completed: Option<bool>) -> Result<Vec<Todo>> {
        repository(ctx)?
            .select_todos(completed)
            .await
            .map_err(|e| e.extend())
    }

    async fn get_todo(&self, ctx: &Context<'_>, id: Option<i32>) -> Result<Todo> {
        let id = id.ok_or_else(|| Error::new("did not provide id"))?;
        repository(ctx)?
            .select_todo(id)
            .await
            .map_err(|e| e.extend())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_todo(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
        deadline: DateTime<Utc>,
        completed: bool,
    ) -> Result<Todo> {
        let repository = repository(ctx)?;
        let draft = TodoDraft {
            name,
            description,
            deadline,
            completed,
        };

        let id = repository
            .insert_todo(draft.clone())
            .await
            .map_err(|e| e.extend())?;
        Ok(draft.into_todo(id))
    }

    /// Overwrites only the arguments that are present, unlike REST `PUT /todos/{id}`
    /// which replaces every field.
    async fn update_todo(
        &self,
        ctx: &Context<'_>,
        id: i32,
        name: Option<String>,
        description: Option<String>,
        deadline: Option<DateTime<Utc>>,
        completed: Option<bool>,
    ) -> Result<Todo> {
        let repository = repository(ctx)?;
        let mut todo = repository.select_todo(id).await.map_err(|e| e.extend())?;

        if let Some(name) = name {
            todo.name = name;
        }
        if let Some(description) = description {
            todo.description = description;
        }
        if let Some(deadline) = deadline {
            todo.deadline = deadline;
        }
        if let Some(completed) = completed {
            todo.completed = completed;
        }

        repository
            .update_todo(id, todo.draft())
            .await
            .map_err(|e| e.extend())?;
        Ok(todo)
    }

    /// Deletes the todo and returns it as it was
    async fn delete_todo(&self, ctx: &Context<'_>, id: i32) -> Result<Todo> {
        let repository = repository(ctx)?;
        let todo = repository.select_todo(id).await.map_err(|e| e.extend())?;
        repository.delete_todo(id).await.map_err(|e| e.extend())?;
        Ok(todo)
    }
}

pub fn schema(repository: SharedRepository) -> TodoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(repository)
        .finish()
}

/// `POST /graphql` executes `{query, variables}`; `GET /graphql` serves GraphiQL.
pub fn router(repository: SharedRepository) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(execute))
        .with_state(schema(repository))
}

#[instrument(skip_all, fields(operation = request.operation_name.as_deref().unwrap_or("")))]
async fn execute(
    State(schema): State<TodoSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
