use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, header};

use crate::application::ports::session_lookup::SessionLookup;
use crate::application::ports::session_repository::SessionRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::auth::get_session::GetSession;
use crate::domain::auth::session::AuthSession;

pub const SESSION_COOKIE: &str = "session_token";

/// Reads the session token from `Authorization: Bearer` or, failing that,
/// the session cookie.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(t) = auth.strip_prefix("Bearer ") {
            let t = t.trim();
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie_hdr| get_cookie(cookie_hdr, SESSION_COOKIE))
}

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name && !v.trim().is_empty() {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

pub fn build_session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        token,
        secure_attr,
        max_age_secs.max(0)
    )
}

pub fn clear_session_cookie(secure: bool) -> String {
    build_session_cookie("", 0, secure)
}

/// Session lookup backed by the user and session repositories.
pub struct TokenSessionLookup {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl TokenSessionLookup {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { users, sessions }
    }
}

#[async_trait]
impl SessionLookup for TokenSessionLookup {
    async fn get_session(&self, headers: &HeaderMap) -> anyhow::Result<Option<AuthSession>> {
        let Some(token) = session_token_from_headers(headers) else {
            return Ok(None);
        };
        GetSession {
            users: self.users.as_ref(),
            sessions: self.sessions.as_ref(),
        }
        .execute(&token)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    use crate::application::ports::session_repository::SessionOrigin;
    use crate::test_support::{InMemorySessions, InMemoryUsers};

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session_token=from-cookie"),
        );
        assert_eq!(session_token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=xyz; lang=en"),
        );
        assert_eq!(session_token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert!(session_token_from_headers(&headers).is_none());
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            build_session_cookie("t", 60, true),
            "session_token=t; HttpOnly; Secure; Path=/; Max-Age=60; SameSite=Lax"
        );
        assert_eq!(
            clear_session_cookie(false),
            "session_token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
        );
    }

    #[tokio::test]
    async fn lookup_resolves_cookie_sessions() {
        let users = Arc::new(InMemoryUsers::default());
        let sessions = Arc::new(InMemorySessions::default());
        let user = users
            .create_user("Ada", "ada@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        sessions
            .create_session(
                user.id,
                "tok",
                chrono::Utc::now() + chrono::Duration::hours(1),
                &SessionOrigin::default(),
            )
            .await
            .unwrap();
        let lookup = TokenSessionLookup::new(users, sessions);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token=tok"));
        let found = lookup.get_session(&headers).await.unwrap().unwrap();
        assert_eq!(found.user.email, "ada@example.com");

        assert!(lookup.get_session(&HeaderMap::new()).await.unwrap().is_none());
    }
}
