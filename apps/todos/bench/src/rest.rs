use async_trait::async_trait;
use domain_todos::{Envelope, Todo, TodoDraft};
use eyre::{Result, WrapErr, eyre};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::driver::Driver;

pub struct RestDriver {
    client: Client,
    base_url: String,
}

impl RestDriver {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn all(&self) -> Result<Vec<Todo>> {
        let response = self.client.get(self.url("/todos")).send().await?;
        Ok(expect(response, StatusCode::OK).await?.json().await?)
    }
}

/// Fails with the envelope's message when the status is not `wanted`.
async fn expect(response: Response, wanted: StatusCode) -> Result<Response> {
    let status = response.status();
    if status == wanted {
        return Ok(response);
    }

    let message = response
        .json::<Envelope>()
        .await
        .map(|envelope| envelope.message)
        .unwrap_or_default();
    Err(eyre!("unexpected status {status}: {message}"))
}

#[async_trait]
impl Driver for RestDriver {
    fn protocol(&self) -> &'static str {
        "rest"
    }

    // POST answers with an envelope only, so the id is found by name.
    async fn create(&self, draft: &TodoDraft) -> Result<i32> {
        let response = self
            .client
            .post(self.url("/todos"))
            .json(draft)
            .send()
            .await?;
        expect(response, StatusCode::ACCEPTED).await?;

        self.all()
            .await?
            .into_iter()
            .find(|todo| todo.name == draft.name)
            .map(|todo| todo.id)
            .ok_or_else(|| eyre!("created todo '{}' missing from list", draft.name))
    }

    async fn get(&self, id: i32) -> Result<()> {
        let response = self
            .client
            .get(self.url(&format!("/todos/{id}")))
            .send()
            .await?;
        expect(response, StatusCode::OK).await?;
        Ok(())
    }

    async fn update(&self, id: i32, draft: &TodoDraft) -> Result<()> {
        let response = self
            .client
            .put(self.url(&format!("/todos/{id}")))
            .json(draft)
            .send()
            .await?;
        expect(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    async fn list(&self) -> Result<usize> {
        Ok(self.all().await?.len())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/todos/{id}")))
            .send()
            .await?;
        expect(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }
}
