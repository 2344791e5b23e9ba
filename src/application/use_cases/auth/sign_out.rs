use crate::application::ports::session_repository::SessionRepository;

pub struct SignOut<'a, S: SessionRepository + ?Sized> {
    pub sessions: &'a S,
}

impl<'a, S: SessionRepository + ?Sized> SignOut<'a, S> {
    pub async fn execute(&self, token: Option<&str>) -> anyhow::Result<bool> {
        match token {
            Some(t) => self.sessions.delete_by_token(t).await,
            None => Ok(false),
        }
    }
}
