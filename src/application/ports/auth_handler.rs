use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

/// Owner of the `/api/auth/*` surface. Requests under that prefix are
/// handed over whole and its response is returned as-is.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    async fn handle(&self, req: Request) -> Response;
}
