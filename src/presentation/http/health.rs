use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::bootstrap::app_context::AppContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    pub status: &'static str,
}

#[utoipa::path(get, path = "/", tag = "Health", responses((status = 200, body = String, content_type = "text/plain")))]
pub async fn ok() -> &'static str {
    "OK"
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResp> {
    let store = ctx.store_health();
    let db_ok = matches!(
        tokio::time::timeout(ctx.cfg.session_fetch_timeout, store.ping()).await,
        Ok(Ok(()))
    );
    if !db_ok {
        tracing::warn!("store_unreachable");
    }
    let status = if db_ok { "ok" } else { "degraded" };
    Json(HealthResp { status })
}
