use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::dispatch::{Dispatch, in_scope};
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::errors;

pub const AUTH_PREFIX: &str = "/api/auth";
pub const RPC_PREFIX: &str = "/rpc";
pub const API_REFERENCE_PREFIX: &str = "/api-reference";

fn is_auth_request(req: &Request) -> bool {
    (req.method() == Method::GET || req.method() == Method::POST)
        && in_scope(req.uri().path(), AUTH_PREFIX)
}

/// Per-request pipeline: auth passthrough, then context building, then the
/// strategy chain; unmatched requests continue to the router's own routes.
pub async fn route_request(State(ctx): State<AppContext>, req: Request, next: Next) -> Response {
    if is_auth_request(&req) {
        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            "auth_request_received"
        );
        return ctx.auth_handler().handle(req).await;
    }

    let request_ctx = ctx.context_builder().build(req.headers()).await;
    let path = req.uri().path().to_owned();
    match ctx.dispatch_chain().dispatch(req, &request_ctx).await {
        Ok(Dispatch::Matched(resp)) => resp,
        Ok(Dispatch::Unmatched(req)) => next.run(req).await,
        Err(err) => {
            tracing::error!(
                strategy = err.strategy,
                path = %path,
                error = ?err.error,
                "strategy_handler_error"
            );
            let detail = (!ctx.cfg.is_production).then(|| err.error.to_string());
            errors::internal_error(&path, detail)
        }
    }
}
