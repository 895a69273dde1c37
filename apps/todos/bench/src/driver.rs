use async_trait::async_trait;
use domain_todos::TodoDraft;
use eyre::Result;

/// One protocol's view of the five calls an iteration makes
#[async_trait]
pub trait Driver: Send + Sync {
    fn protocol(&self) -> &'static str;

    /// Inserts and returns the new id
    async fn create(&self, draft: &TodoDraft) -> Result<i32>;

    async fn get(&self, id: i32) -> Result<()>;

    async fn update(&self, id: i32, draft: &TodoDraft) -> Result<()>;

    /// Number of todos returned
    async fn list(&self) -> Result<usize>;

    async fn delete(&self, id: i32) -> Result<()>;
}
