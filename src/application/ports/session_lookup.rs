use async_trait::async_trait;
use http::HeaderMap;

use crate::domain::auth::session::AuthSession;

/// Resolves the caller's session from request headers.
///
/// `Ok(None)` means the caller is anonymous; `Err` means the store could not
/// answer. Callers on the request path treat both the same way.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> anyhow::Result<Option<AuthSession>>;
}
