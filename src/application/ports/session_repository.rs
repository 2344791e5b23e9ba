use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::auth::session::Session;

#[derive(Debug, Clone, Default)]
pub struct SessionOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
        origin: &SessionOrigin,
    ) -> anyhow::Result<Session>;
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<Session>>;
    async fn delete_by_token(&self, token: &str) -> anyhow::Result<bool>;
    async fn delete_expired(&self, now: chrono::DateTime<chrono::Utc>) -> anyhow::Result<u64>;
}
