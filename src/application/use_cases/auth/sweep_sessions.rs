use crate::application::ports::session_repository::SessionRepository;

pub struct SweepExpiredSessions<'a, S: SessionRepository + ?Sized> {
    pub sessions: &'a S,
}

impl<'a, S: SessionRepository + ?Sized> SweepExpiredSessions<'a, S> {
    pub async fn execute(&self) -> anyhow::Result<u64> {
        let removed = self.sessions.delete_expired(chrono::Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired_sessions_swept");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::session_repository::SessionOrigin;
    use crate::test_support::InMemorySessions;
    use uuid::Uuid;

    #[tokio::test]
    async fn removes_only_expired_sessions() {
        let sessions = InMemorySessions::default();
        let now = chrono::Utc::now();
        let user = Uuid::new_v4();
        let origin = SessionOrigin::default();
        sessions
            .create_session(user, "old", now - chrono::Duration::minutes(5), &origin)
            .await
            .unwrap();
        sessions
            .create_session(user, "new", now + chrono::Duration::minutes(5), &origin)
            .await
            .unwrap();

        let removed = SweepExpiredSessions {
            sessions: &sessions,
        }
        .execute()
        .await
        .unwrap();
        assert_eq!(removed, 1);
        assert!(sessions.find_by_token("new").await.unwrap().is_some());
    }
}
