//! In-memory doubles shared by the unit test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::session_repository::{SessionOrigin, SessionRepository};
use crate::application::ports::store_health::StoreHealth;
use crate::application::ports::user_repository::{UserRepository, UserRow};
use crate::domain::auth::session::Session;

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, UserRow>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<UserRow>> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|r| r.email == email) {
            return Ok(None);
        }
        let now = chrono::Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            email_verified: false,
            password_hash: Some(password_hash.to_string()),
            created_at: now,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().find(|r| r.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id).map(|r| UserRow {
            password_hash: None,
            ..r.clone()
        }))
    }
}

#[derive(Default)]
pub struct InMemorySessions {
    rows: Mutex<HashMap<String, Session>>,
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
        origin: &SessionOrigin,
    ) -> anyhow::Result<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            token: token.to_string(),
            user_id,
            expires_at,
            ip_address: origin.ip_address.clone(),
            user_agent: origin.user_agent.clone(),
            created_at: chrono::Utc::now(),
        };
        self.rows
            .lock()
            .unwrap()
            .insert(token.to_string(), session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.rows.lock().unwrap().get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> anyhow::Result<bool> {
        Ok(self.rows.lock().unwrap().remove(token).is_some())
    }

    async fn delete_expired(&self, now: chrono::DateTime<chrono::Utc>) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, s| !s.is_expired_at(now));
        Ok((before - rows.len()) as u64)
    }
}

pub struct StubHealth {
    pub healthy: bool,
}

#[async_trait]
impl StoreHealth for StubHealth {
    async fn ping(&self) -> anyhow::Result<()> {
        if self.healthy {
            Ok(())
        } else {
            anyhow::bail!("store unreachable")
        }
    }
}
