use async_graphql::{Request, Variables};
use axum::{
    body::Body,
    http::{Request as HttpRequest, StatusCode},
};
use chrono::{DateTime, Utc};
use domain_todos::handlers::graphql::{self, TodoSchema};
use domain_todos::memory::{FailureKind, Operation, Target};
use domain_todos::{InMemoryTodoRepository, TodoRepository};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn schema(repo: &InMemoryTodoRepository) -> TodoSchema {
    graphql::schema(Arc::new(repo.clone()))
}

async fn run(schema: &TodoSchema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

fn error_code(response: &async_graphql::Response) -> Option<String> {
    let extensions = response.errors.first()?.extensions.as_ref()?;
    match extensions.get("code")? {
        async_graphql::Value::String(code) => Some(code.clone()),
        _ => None,
    }
}

fn parse_time(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_create_then_get() {
    let repo = InMemoryTodoRepository::new();
    let schema = schema(&repo);

    let created = run(
        &schema,
        r#"mutation {
            createTodo(name: "X", description: "Y", deadline: "2025-03-01T12:00:00Z", completed: false) {
                id name description deadline completed
            }
        }"#,
    )
    .await;
    let id = created["createTodo"]["id"].as_i64().unwrap();
    assert!(id > 0);

    let fetched = run(
        &schema,
        &format!("{{ getTodo(id: {id}) {{ id name description deadline completed }} }}"),
    )
    .await;

    let todo = &fetched["getTodo"];
    assert_eq!(todo["name"], "X");
    assert_eq!(todo["description"], "Y");
    assert_eq!(todo["completed"], false);
    assert_eq!(
        parse_time(&todo["deadline"]),
        "2025-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
    );
    assert_eq!(todo, &created["createTodo"]);
}

#[tokio::test]
async fn test_create_with_variables() {
    let repo = InMemoryTodoRepository::new();
    let schema = schema(&repo);

    let request = Request::new(
        "mutation Create($name: String!, $deadline: DateTime!) {
            createTodo(name: $name, description: \"\", deadline: $deadline, completed: true) { id completed }
        }",
    )
    .variables(Variables::from_json(json!({
        "name": "Water plants",
        "deadline": "2025-06-01T08:00:00Z"
    })));

    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let stored = repo.select_todos(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Water plants");
    assert!(stored[0].completed);
}

#[tokio::test]
async fn test_create_answers_without_reading_back() {
    let repo = InMemoryTodoRepository::new().fail_on(
        Operation::SelectTodo,
        Target::Any,
        FailureKind::Timeout,
    );

    let created = run(
        &schema(&repo),
        r#"mutation {
            createTodo(name: "Once", description: "", deadline: "2025-02-01T00:00:00Z", completed: false) {
                id name completed
            }
        }"#,
    )
    .await;

    assert!(created["createTodo"]["id"].as_i64().unwrap() > 0);
    assert_eq!(created["createTodo"]["name"], "Once");
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_create_empty_name_is_a_validation_error() {
    let repo = InMemoryTodoRepository::new();

    let response = schema(&repo)
        .execute(
            r#"mutation { createTodo(name: "", description: "", deadline: "2025-01-01T00:00:00Z", completed: false) { id } }"#,
        )
        .await;

    assert_eq!(error_code(&response).as_deref(), Some("VALIDATION"));
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_update_only_touches_given_fields() {
    let repo = InMemoryTodoRepository::new();
    let schema = schema(&repo);
    run(
        &schema,
        r#"mutation { createTodo(name: "Draft", description: "keep me", deadline: "2025-01-01T00:00:00Z", completed: false) { id } }"#,
    )
    .await;

    let updated = run(
        &schema,
        r#"mutation { updateTodo(id: 1, completed: true) { name description completed } }"#,
    )
    .await;

    assert_eq!(
        updated["updateTodo"],
        json!({"name": "Draft", "description": "keep me", "completed": true})
    );
    let stored = repo.select_todo(1).await.unwrap();
    assert_eq!(stored.description, "keep me");
    assert!(stored.completed);
}

#[tokio::test]
async fn test_update_unknown_id() {
    let repo = InMemoryTodoRepository::new();

    let response = schema(&repo)
        .execute(r#"mutation { updateTodo(id: 4, name: "x") { id } }"#)
        .await;

    assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_delete_returns_removed_todo() {
    let repo = InMemoryTodoRepository::new();
    let schema = schema(&repo);
    run(
        &schema,
        r#"mutation { createTodo(name: "Gone soon", description: "", deadline: "2025-01-01T00:00:00Z", completed: false) { id } }"#,
    )
    .await;

    let deleted = run(&schema, "mutation { deleteTodo(id: 1) { id name } }").await;
    assert_eq!(deleted["deleteTodo"], json!({"id": 1, "name": "Gone soon"}));

    let response = schema.execute("{ getTodo(id: 1) { id } }").await;
    assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_get_todos_is_ordered_and_filterable() {
    let repo = InMemoryTodoRepository::new();
    let schema = schema(&repo);
    for (name, deadline, completed) in [
        ("later", "2025-05-01T00:00:00Z", false),
        ("sooner", "2025-02-01T00:00:00Z", true),
    ] {
        run(
            &schema,
            &format!(
                r#"mutation {{ createTodo(name: "{name}", description: "", deadline: "{deadline}", completed: {completed}) {{ id }} }}"#
            ),
        )
        .await;
    }

    let all = run(&schema, "{ getTodos { name } }").await;
    assert_eq!(
        all["getTodos"],
        json!([{"name": "sooner"}, {"name": "later"}])
    );

    let open = run(&schema, "{ getTodos(completed: false) { name } }").await;
    assert_eq!(open["getTodos"], json!([{"name": "later"}]));
}

#[tokio::test]
async fn test_http_endpoint() {
    let repo = InMemoryTodoRepository::new();
    let app = graphql::router(Arc::new(repo.clone()));

    let body = json!({
        "query": "mutation($d: DateTime!) { createTodo(name: \"Via HTTP\", description: \"\", deadline: $d, completed: false) { id name } }",
        "variables": {"d": "2025-01-01T00:00:00Z"}
    });
    let request = HttpRequest::post("/graphql")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["data"]["createTodo"]["name"], "Via HTTP");
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_graphiql_page() {
    let app = graphql::router(Arc::new(InMemoryTodoRepository::new()));

    let response = app
        .oneshot(HttpRequest::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
