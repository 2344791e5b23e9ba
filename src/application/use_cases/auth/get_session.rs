use crate::application::ports::session_repository::SessionRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::auth::session::AuthSession;

pub struct GetSession<'a, U: UserRepository + ?Sized, S: SessionRepository + ?Sized> {
    pub users: &'a U,
    pub sessions: &'a S,
}

impl<'a, U, S> GetSession<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub async fn execute(&self, token: &str) -> anyhow::Result<Option<AuthSession>> {
        let Some(session) = self.sessions.find_by_token(token).await? else {
            return Ok(None);
        };
        if session.is_expired_at(chrono::Utc::now()) {
            return Ok(None);
        }
        let Some(user) = self.users.find_by_id(session.user_id).await? else {
            return Ok(None);
        };
        Ok(Some(AuthSession {
            session,
            user: user.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::session_repository::SessionOrigin;
    use crate::test_support::{InMemorySessions, InMemoryUsers};

    #[tokio::test]
    async fn resolves_live_sessions_only() {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        let user = users
            .create_user("Ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        let now = chrono::Utc::now();
        sessions
            .create_session(user.id, "live", now + chrono::Duration::hours(1), &SessionOrigin::default())
            .await
            .unwrap();
        sessions
            .create_session(user.id, "stale", now - chrono::Duration::hours(1), &SessionOrigin::default())
            .await
            .unwrap();

        let uc = GetSession {
            users: &users,
            sessions: &sessions,
        };
        let live = uc.execute("live").await.unwrap().unwrap();
        assert_eq!(live.user.id, user.id);
        assert!(uc.execute("stale").await.unwrap().is_none());
        assert!(uc.execute("unknown").await.unwrap().is_none());
    }
}
