use async_trait::async_trait;
use domain_todos::TodoDraft;
use eyre::{Result, WrapErr, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use crate::driver::Driver;

const CREATE: &str = r#"
mutation Create($name: String!, $description: String!, $deadline: DateTime!, $completed: Boolean!) {
  createTodo(name: $name, description: $description, deadline: $deadline, completed: $completed) { id }
}"#;

const GET: &str = "query Get($id: Int) { getTodo(id: $id) { id name } }";

const UPDATE: &str = r#"
mutation Update($id: Int!, $name: String, $description: String, $deadline: DateTime, $completed: Boolean) {
  updateTodo(id: $id, name: $name, description: $description, deadline: $deadline, completed: $completed) { id }
}"#;

const LIST: &str = "query List { getTodos { id } }";

const DELETE: &str = "mutation Delete($id: Int!) { deleteTodo(id: $id) { id } }";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

pub struct GraphqlDriver {
    client: Client,
    url: String,
}

impl GraphqlDriver {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Posts one operation and returns `data.<field>`.
    async fn execute(&self, query: &str, variables: Value, field: &str) -> Result<Value> {
        let response: GraphqlResponse = self
            .client
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        extract(response, field)
    }
}

fn extract(response: GraphqlResponse, field: &str) -> Result<Value> {
    if let Some(error) = response.errors.first() {
        return Err(eyre!("graphql error: {}", error.message));
    }

    response
        .data
        .and_then(|mut data| data.get_mut(field).map(Value::take))
        .filter(|value| !value.is_null())
        .ok_or_else(|| eyre!("graphql response has no '{field}'"))
}

fn draft_variables(draft: &TodoDraft) -> Value {
    json!({
        "name": draft.name,
        "description": draft.description,
        "deadline": draft.deadline,
        "completed": draft.completed,
    })
}

#[async_trait]
impl Driver for GraphqlDriver {
    fn protocol(&self) -> &'static str {
        "graphql"
    }

    async fn create(&self, draft: &TodoDraft) -> Result<i32> {
        let todo = self
            .execute(CREATE, draft_variables(draft), "createTodo")
            .await?;

        todo["id"]
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| eyre!("createTodo returned no id"))
    }

    async fn get(&self, id: i32) -> Result<()> {
        self.execute(GET, json!({ "id": id }), "getTodo").await?;
        Ok(())
    }

    async fn update(&self, id: i32, draft: &TodoDraft) -> Result<()> {
        let mut variables = draft_variables(draft);
        variables["id"] = json!(id);
        self.execute(UPDATE, variables, "updateTodo").await?;
        Ok(())
    }

    async fn list(&self) -> Result<usize> {
        let todos = self.execute(LIST, json!({}), "getTodos").await?;
        todos
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| eyre!("getTodos did not return a list"))
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.execute(DELETE, json!({ "id": id }), "deleteTodo")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: Value) -> GraphqlResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_field() {
        let value = extract(
            response(json!({ "data": { "createTodo": { "id": 7 } } })),
            "createTodo",
        )
        .unwrap();
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_extract_reports_first_error() {
        let err = extract(
            response(json!({
                "data": null,
                "errors": [{ "message": "todo 9 not found", "extensions": { "code": "NOT_FOUND" } }]
            })),
            "getTodo",
        )
        .unwrap_err();
        assert!(err.to_string().contains("todo 9 not found"));
    }

    #[test]
    fn test_extract_missing_field() {
        assert!(extract(response(json!({ "data": { "getTodo": null } })), "getTodo").is_err());
    }
}
