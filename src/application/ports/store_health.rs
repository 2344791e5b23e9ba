use async_trait::async_trait;

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
}
