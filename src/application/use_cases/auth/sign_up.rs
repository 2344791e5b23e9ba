use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use password_hash::rand_core::OsRng;

use super::{AuthError, MIN_PASSWORD_LEN, SignedIn, generate_session_token};
use crate::application::ports::session_repository::{SessionOrigin, SessionRepository};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::auth::user::User;

pub struct SignUp<'a, U: UserRepository + ?Sized, S: SessionRepository + ?Sized> {
    pub users: &'a U,
    pub sessions: &'a S,
    pub session_ttl: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub origin: SessionOrigin,
}

impl<'a, U, S> SignUp<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub async fn execute(&self, req: &SignUpRequest) -> Result<SignedIn, AuthError> {
        let name = req.name.trim();
        let email = User::normalize_email(&req.email);
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name is required".into()));
        }
        if !email.contains('@') {
            return Err(AuthError::InvalidInput("email is invalid".into()));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .to_string();
        // A concurrent sign-up can take the email between the check and the insert.
        let user: User = self
            .users
            .create_user(name, &email, &hash)
            .await?
            .ok_or(AuthError::UserAlreadyExists)?
            .into();

        let token = generate_session_token();
        let expires_at = chrono::Utc::now() + self.session_ttl;
        let session = self
            .sessions
            .create_session(user.id, &token, expires_at, &req.origin)
            .await?;
        tracing::info!(user_id = %user.id, "user_signed_up");
        Ok(SignedIn {
            token,
            session,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::application::ports::user_repository::UserRow;
    use crate::test_support::{InMemorySessions, InMemoryUsers};

    /// Loses every insert to a concurrent writer of the same email.
    struct RacingUsers;

    #[async_trait]
    impl UserRepository for RacingUsers {
        async fn create_user(&self, _: &str, _: &str, _: &str) -> anyhow::Result<Option<UserRow>> {
            Ok(None)
        }

        async fn find_by_email(&self, _: &str) -> anyhow::Result<Option<UserRow>> {
            Ok(None)
        }

        async fn find_by_id(&self, _: Uuid) -> anyhow::Result<Option<UserRow>> {
            Ok(None)
        }
    }

    fn request(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            name: "Ada".into(),
            email: email.into(),
            password: password.into(),
            origin: SessionOrigin::default(),
        }
    }

    #[tokio::test]
    async fn creates_user_and_session() {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        let uc = SignUp {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let out = uc
            .execute(&request(" Ada@Example.com ", "correct horse"))
            .await
            .unwrap();
        assert_eq!(out.user.email, "ada@example.com");
        assert_eq!(out.session.user_id, out.user.id);
        assert_eq!(out.session.token, out.token);
        assert!(sessions.find_by_token(&out.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        let uc = SignUp {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        uc.execute(&request("ada@example.com", "correct horse"))
            .await
            .unwrap();
        let err = uc
            .execute(&request("ADA@example.com", "another secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn insert_conflict_is_reported_as_existing_user() {
        let sessions = InMemorySessions::default();
        let uc = SignUp {
            users: &RacingUsers,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let err = uc
            .execute(&request("ada@example.com", "correct horse"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.code(), "USER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn rejects_short_password() {
        let users = InMemoryUsers::default();
        let sessions = InMemorySessions::default();
        let uc = SignUp {
            users: &users,
            sessions: &sessions,
            session_ttl: chrono::Duration::days(7),
        };
        let err = uc
            .execute(&request("ada@example.com", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
