use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::{instrument, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::envelope::Envelope;
use crate::error::{TodoError, TodoResult};
use crate::models::{Todo, TodoDraft};
use crate::repository::SharedRepository;

/// Payload of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Only return todos with this completion state
    completed: Option<String>,
}

/// Last path segment of `PUT /todos/{id}/{status}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
enum Completion {
    Complete,
    Incomplete,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        service_info,
        list_todos,
        get_todo,
        create_todo,
        update_todo,
        set_completion,
        delete_todo
    ),
    components(schemas(Todo, TodoDraft, Envelope, ServiceInfo)),
    tags((name = "todos", description = "Todo CRUD over REST"))
)]
pub struct RestApiDoc;

/// REST routes, plus the OpenAPI document at `/openapi.json`
pub fn router(repository: SharedRepository) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/{status}", put(set_completion))
        .route("/openapi.json", get(openapi))
        .with_state(repository)
}

// Every failure answers 400 with an envelope; the message tells a timeout
// apart from the other kinds.
impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        warn!(error = %self, code = self.code(), "request failed");
        (StatusCode::BAD_REQUEST, Json(Envelope::from(&self))).into_response()
    }
}

fn accepted(message: &str) -> Response {
    (StatusCode::ACCEPTED, Json(Envelope::success(message))).into_response()
}

fn parse_id(raw: &str) -> TodoResult<i32> {
    raw.parse()
        .map_err(|_| TodoError::Validation(format!("invalid id '{raw}'")))
}

/// Boolean literals accepted in query strings
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn body(payload: Result<Json<TodoDraft>, JsonRejection>) -> TodoResult<TodoDraft> {
    payload
        .map(|Json(draft)| draft)
        .map_err(|rejection| TodoError::Validation(rejection.body_text()))
}

/// Service status
#[utoipa::path(
    get,
    path = "/",
    tag = "todos",
    responses((status = 200, description = "Service is up", body = ServiceInfo))
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "active".to_string(),
        message: "Todos API is up and running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(RestApiDoc::openapi())
}

/// List todos ordered by deadline
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    params(ListParams),
    responses(
        (status = 200, description = "Todos ordered by deadline", body = Vec<Todo>),
        (status = 400, description = "Invalid filter or store failure", body = Envelope)
    )
)]
#[instrument(skip(repository))]
pub async fn list_todos(
    State(repository): State<SharedRepository>,
    Query(params): Query<ListParams>,
) -> TodoResult<Json<Vec<Todo>>> {
    let completed = params
        .completed
        .as_deref()
        .map(|raw| {
            parse_bool(raw).ok_or_else(|| {
                TodoError::Validation(format!("completed must be a boolean, got '{raw}'"))
            })
        })
        .transpose()?;

    Ok(Json(repository.select_todos(completed).await?))
}

/// Get one todo
#[utoipa::path(
    get,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo found", body = Todo),
        (status = 400, description = "Invalid id or todo not found", body = Envelope)
    )
)]
#[instrument(skip(repository))]
pub async fn get_todo(
    State(repository): State<SharedRepository>,
    Path(id): Path<String>,
) -> TodoResult<Json<Todo>> {
    let id = parse_id(&id)?;
    Ok(Json(repository.select_todo(id).await?))
}

/// Create a todo
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    request_body = TodoDraft,
    responses(
        (status = 202, description = "Todo inserted", body = Envelope),
        (status = 400, description = "Malformed body or empty name", body = Envelope)
    )
)]
#[instrument(skip_all)]
pub async fn create_todo(
    State(repository): State<SharedRepository>,
    payload: Result<Json<TodoDraft>, JsonRejection>,
) -> TodoResult<Response> {
    let draft = body(payload)?;
    repository.insert_todo(draft).await?;
    Ok(accepted("todo inserted"))
}

/// Replace every field of a todo
#[utoipa::path(
    put,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    request_body = TodoDraft,
    responses(
        (status = 202, description = "Todo updated", body = Envelope),
        (status = 400, description = "Malformed body or store failure", body = Envelope)
    )
)]
#[instrument(skip(repository, payload))]
pub async fn update_todo(
    State(repository): State<SharedRepository>,
    Path(id): Path<String>,
    payload: Result<Json<TodoDraft>, JsonRejection>,
) -> TodoResult<Response> {
    let id = parse_id(&id)?;
    let draft = body(payload)?;
    repository.update_todo(id, draft).await?;
    Ok(accepted("todo updated"))
}

/// Mark a todo complete or incomplete
#[utoipa::path(
    put,
    path = "/todos/{id}/{status}",
    tag = "todos",
    params(
        ("id" = i32, Path, description = "Todo id"),
        ("status" = String, Path, description = "`complete` or `incomplete`")
    ),
    responses(
        (status = 202, description = "Status updated", body = Envelope),
        (status = 400, description = "Unknown status or store failure", body = Envelope)
    )
)]
#[instrument(skip(repository))]
pub async fn set_completion(
    State(repository): State<SharedRepository>,
    Path((id, status)): Path<(String, String)>,
) -> TodoResult<Response> {
    let id = parse_id(&id)?;
    let completion = Completion::from_str(&status).map_err(|_| {
        TodoError::Validation(format!(
            "status must be 'complete' or 'incomplete', got '{status}'"
        ))
    })?;

    repository
        .update_todo_completed(id, completion == Completion::Complete)
        .await?;
    Ok(accepted(&format!("todo marked {completion}")))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    responses(
        (status = 202, description = "Todo deleted", body = Envelope),
        (status = 400, description = "Invalid id or store failure", body = Envelope)
    )
)]
#[instrument(skip(repository))]
pub async fn delete_todo(
    State(repository): State<SharedRepository>,
    Path(id): Path<String>,
) -> TodoResult<Response> {
    let id = parse_id(&id)?;
    repository.delete_todo(id).await?;
    Ok(accepted("todo deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockTodoRepository;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn envelope(response: Response) -> Envelope {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_bool_literals() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_completion_segment() {
        assert_eq!(Completion::from_str("complete").unwrap(), Completion::Complete);
        assert_eq!(
            Completion::from_str("incomplete").unwrap(),
            Completion::Incomplete
        );
        assert!(Completion::from_str("done").is_err());
    }

    #[tokio::test]
    async fn test_timeout_is_a_bad_request() {
        let mut mock = MockTodoRepository::new();
        mock.expect_select_todo()
            .withf(|id| *id == 3)
            .returning(|_| Err(TodoError::Timeout("select_todo".into())));

        let app = router(Arc::new(mock));
        let response = app
            .oneshot(Request::get("/todos/3").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = envelope(response).await;
        assert!(body.error);
        assert_eq!(body.message, "select_todo timed out");
    }

    #[tokio::test]
    async fn test_non_numeric_id_never_reaches_the_store() {
        // No expectations: any store call panics the mock.
        let app = router(Arc::new(MockTodoRepository::new()));

        let response = app
            .oneshot(Request::delete("/todos/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope(response).await.message, "invalid todo: invalid id 'abc'");
    }

    #[tokio::test]
    async fn test_full_replace_passes_path_id_and_body() {
        let mut mock = MockTodoRepository::new();
        mock.expect_update_todo()
            .withf(|id, draft| *id == 8 && draft.name == "Renamed" && draft.completed)
            .times(1)
            .returning(|_, _| Ok(()));

        let app = router(Arc::new(mock));
        let request = Request::put("/todos/8")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"id":99,"name":"Renamed","description":"","deadline":"2025-02-01T00:00:00Z","completed":true}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(envelope(response).await, Envelope::success("todo updated"));
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let doc = RestApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/todos"));
        assert!(doc.paths.paths.contains_key("/todos/{id}/{status}"));
    }
}
