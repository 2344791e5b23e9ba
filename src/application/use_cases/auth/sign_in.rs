use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use super::{AuthError, SignedIn, generate_session_token};
use crate::application::ports::session_repository::{SessionOrigin, SessionRepository};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::auth::user::User;

pub struct SignIn<'a, U: UserRepository + ?Sized, S: SessionRepository + ?Sized> {
    pub users: &'a U,
    pub sessions: &'a S,
    pub session_ttl: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    pub origin: SessionOrigin,
}

impl<'a, U, S> SignIn<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub async fn execute(&self, req: &SignInRequest) -> Result<SignedIn, AuthError> {
        let email = User::normalize_email(&req.email);
        let row = match self.users.find_by_email(&email).await? {
            Some(r) => r,
            None => return Err(AuthError::InvalidCredentials),
        };
        // accounts without a password cannot sign in with one
        let Some(hash) = row.password_hash.clone() else {
            return Err(AuthError::InvalidCredentials);
        };
        let parsed = PasswordHash::new(&hash).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::InvalidCredentials);
        }

        let user: User = row.into();
        let token = generate_session_token();
        let expires_at = chrono::Utc::now() + self.session_ttl;
        let session = self
            .sessions
            .create_session(user.id, &token, expires_at, &req.origin)
            .await?;
        tracing::info!(user_id = %user.id, "user_signed_in");
        Ok(SignedIn {
            token,
            session,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::auth::sign_up::{SignUp, SignUpRequest};
    use crate::test_support::{InMemorySessions, InMemoryUsers};

    async fn seeded() -> (InMemoryUsers, InMemorySessions) {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        SignUp {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        }
        .execute(&SignUpRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "correct horse".into(),
            origin: SessionOrigin::default(),
        })
        .await
        .unwrap();
        (users, sessions)
    }

    fn request(password: &str) -> SignInRequest {
        SignInRequest {
            email: "ADA@example.com".into(),
            password: password.into(),
            origin: SessionOrigin {
                ip_address: Some("127.0.0.1".into()),
                user_agent: Some("tests".into()),
            },
        }
    }

    #[tokio::test]
    async fn issues_a_fresh_session_for_valid_credentials() {
        let (users, sessions) = seeded().await;
        let uc = SignIn {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let out = uc.execute(&request("correct horse")).await.unwrap();
        assert_eq!(out.user.email, "ada@example.com");
        assert_eq!(out.session.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (users, sessions) = seeded().await;
        let uc = SignIn {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let err = uc.execute(&request("wrong horse")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn rejects_unknown_email() {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        let uc = SignIn {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let err = uc.execute(&request("correct horse")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
