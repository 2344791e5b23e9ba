use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::session_repository::{SessionOrigin, SessionRepository};
use crate::domain::auth::session::Session;
use crate::infrastructure::db::PgPool;

pub struct SqlxSessionRepository {
    pub pool: PgPool,
}

impl SqlxSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Session {
    Session {
        id: r.get("id"),
        token: r.get("token"),
        user_id: r.get("user_id"),
        expires_at: r.get("expires_at"),
        ip_address: r.get("ip_address"),
        user_agent: r.get("user_agent"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
        origin: &SessionOrigin,
    ) -> anyhow::Result<Session> {
        let row = sqlx::query(
            r#"INSERT INTO sessions (id, token, user_id, expires_at, ip_address, user_agent)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, token, user_id, expires_at, ip_address, user_agent, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .bind(origin.ip_address.as_deref())
        .bind(origin.user_agent.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(map_row(&row))
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query(
            r#"SELECT id, token, user_id, expires_at, ip_address, user_agent, created_at
               FROM sessions WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn delete_by_token(&self, token: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: chrono::DateTime<chrono::Utc>) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
