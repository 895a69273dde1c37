use async_trait::async_trait;
use domain_todos::TodoDraft;
use domain_todos::conversions::to_timestamp;
use eyre::{Result, WrapErr};
use rpc::todos::{Id, Todo, todo_service_client::TodoServiceClient};
use tonic::codec::CompressionEncoding;
use tonic::transport::Channel;

use crate::driver::Driver;

pub struct GrpcDriver {
    client: TodoServiceClient<Channel>,
}

impl GrpcDriver {
    pub async fn connect(url: String) -> Result<Self> {
        let client = TodoServiceClient::connect(url.clone())
            .await
            .wrap_err_with(|| format!("failed to connect to {url}"))?
            .send_compressed(CompressionEncoding::Zstd)
            .accept_compressed(CompressionEncoding::Zstd);

        Ok(Self { client })
    }

    // Channel is cheap to clone; each call gets its own handle.
    fn client(&self) -> TodoServiceClient<Channel> {
        self.client.clone()
    }
}

fn message(id: i32, draft: &TodoDraft) -> Todo {
    Todo {
        id,
        name: draft.name.clone(),
        description: draft.description.clone(),
        deadline: Some(to_timestamp(draft.deadline)),
        completed: draft.completed,
    }
}

#[async_trait]
impl Driver for GrpcDriver {
    fn protocol(&self) -> &'static str {
        "grpc"
    }

    async fn create(&self, draft: &TodoDraft) -> Result<i32> {
        let created = self.client().create(message(0, draft)).await?;
        Ok(created.into_inner().id)
    }

    async fn get(&self, id: i32) -> Result<()> {
        self.client().get(Id { id }).await?;
        Ok(())
    }

    async fn update(&self, id: i32, draft: &TodoDraft) -> Result<()> {
        self.client().update(message(id, draft)).await?;
        Ok(())
    }

    async fn list(&self) -> Result<usize> {
        let mut stream = self.client().list(()).await?.into_inner();
        let mut count = 0;
        while stream.message().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.client().delete(Id { id }).await?;
        Ok(())
    }
}
