use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;

use crate::application::ports::session_lookup::SessionLookup;
use crate::domain::auth::session::AuthSession;

pub const DEFAULT_SESSION_FETCH_TIMEOUT: Duration = Duration::from_millis(3000);

/// Per-request context handed to dispatch strategies and procedures.
///
/// Built once before dispatch and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    session: Option<Arc<AuthSession>>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn with_session(session: AuthSession) -> Self {
        Self {
            session: Some(Arc::new(session)),
        }
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

#[derive(Clone)]
pub struct ContextBuilder {
    sessions: Arc<dyn SessionLookup>,
    timeout: Duration,
}

impl ContextBuilder {
    pub fn new(sessions: Arc<dyn SessionLookup>, timeout: Duration) -> Self {
        Self { sessions, timeout }
    }

    /// Races the session lookup against the configured timeout.
    ///
    /// Any failure (store error, panic in the lookup, timeout) yields an
    /// anonymous context so public operations keep working. The lookup runs
    /// on its own task and is aborted when the timer wins.
    pub async fn build(&self, headers: &HeaderMap) -> RequestContext {
        let sessions = self.sessions.clone();
        let headers = headers.clone();
        let mut lookup = tokio::spawn(async move { sessions.get_session(&headers).await });

        match tokio::time::timeout(self.timeout, &mut lookup).await {
            Ok(Ok(Ok(Some(session)))) => RequestContext::with_session(session),
            Ok(Ok(Ok(None))) => RequestContext::anonymous(),
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "session_fetch_failed");
                RequestContext::anonymous()
            }
            Ok(Err(join_err)) => {
                tracing::warn!(error = %join_err, "session_fetch_task_failed");
                RequestContext::anonymous()
            }
            Err(_) => {
                lookup.abort();
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "session_fetch_timeout"
                );
                RequestContext::anonymous()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::time::Instant;
    use uuid::Uuid;

    use crate::domain::auth::session::Session;
    use crate::domain::auth::user::User;

    fn sample_session() -> AuthSession {
        let now = chrono::Utc::now();
        let user_id = Uuid::new_v4();
        AuthSession {
            session: Session {
                id: Uuid::new_v4(),
                token: "token".into(),
                user_id,
                expires_at: now + chrono::Duration::hours(1),
                ip_address: None,
                user_agent: None,
                created_at: now,
            },
            user: User {
                id: user_id,
                name: "Ada".into(),
                email: "ada@example.com".into(),
                email_verified: false,
                created_at: now,
                updated_at: now,
            },
        }
    }

    enum Behaviour {
        Found,
        Anonymous,
        Fail,
        Panic,
        Slow(Duration),
    }

    struct StubLookup {
        behaviour: Behaviour,
        finished: Arc<AtomicBool>,
    }

    impl StubLookup {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                finished: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl SessionLookup for StubLookup {
        async fn get_session(&self, _headers: &HeaderMap) -> anyhow::Result<Option<AuthSession>> {
            match self.behaviour {
                Behaviour::Found => Ok(Some(sample_session())),
                Behaviour::Anonymous => Ok(None),
                Behaviour::Fail => anyhow::bail!("connection refused"),
                Behaviour::Panic => panic!("session store exploded"),
                Behaviour::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    self.finished.store(true, Ordering::SeqCst);
                    Ok(Some(sample_session()))
                }
            }
        }
    }

    fn builder(lookup: StubLookup) -> ContextBuilder {
        ContextBuilder::new(Arc::new(lookup), DEFAULT_SESSION_FETCH_TIMEOUT)
    }

    #[tokio::test]
    async fn found_session_is_carried() {
        let ctx = builder(StubLookup::new(Behaviour::Found))
            .build(&HeaderMap::new())
            .await;
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.session().map(|s| s.user.name.as_str()), Some("Ada"));
    }

    #[tokio::test]
    async fn anonymous_lookup_yields_no_session() {
        let ctx = builder(StubLookup::new(Behaviour::Anonymous))
            .build(&HeaderMap::new())
            .await;
        assert!(ctx.session().is_none());
    }

    #[tokio::test]
    async fn store_errors_are_swallowed() {
        let ctx = builder(StubLookup::new(Behaviour::Fail))
            .build(&HeaderMap::new())
            .await;
        assert!(ctx.session().is_none());
    }

    #[tokio::test]
    async fn panicking_lookup_is_swallowed() {
        let ctx = builder(StubLookup::new(Behaviour::Panic))
            .build(&HeaderMap::new())
            .await;
        assert!(ctx.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_resolves_to_none_at_the_timeout() {
        let lookup = StubLookup::new(Behaviour::Slow(Duration::from_secs(10)));
        let finished = lookup.finished.clone();
        let builder = builder(lookup);

        let started = Instant::now();
        let ctx = builder.build(&HeaderMap::new()).await;
        let elapsed = started.elapsed();

        assert!(ctx.session().is_none());
        assert!(elapsed >= DEFAULT_SESSION_FETCH_TIMEOUT);
        assert!(elapsed < DEFAULT_SESSION_FETCH_TIMEOUT + Duration::from_millis(50));

        // the abandoned lookup never completes after being aborted
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
        assert!(ctx.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_inside_the_window_wins() {
        let ctx = builder(StubLookup::new(Behaviour::Slow(Duration::from_millis(2900))))
            .build(&HeaderMap::new())
            .await;
        assert!(ctx.is_authenticated());
    }
}
