pub mod auth;
pub mod cors;
pub mod dispatch;
pub mod errors;
pub mod health;
pub mod middleware;
pub mod openapi;
pub mod rpc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::bootstrap::app_context::AppContext;

/// Full HTTP surface. Layers run outside-in: trace span, request log, CORS,
/// panic guard, then the dispatch pipeline in front of the plain routes.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(health::ok))
        .route("/health", get(health::health))
        .fallback(errors::not_found)
        .layer(from_fn_with_state(ctx.clone(), dispatch::route_request))
        .layer(from_fn_with_state(
            ctx.cfg.is_production,
            middleware::catch_panic,
        ))
        .layer(from_fn_with_state(ctx.cors(), cors::apply_cors))
        .layer(from_fn(middleware::log_request))
        .layer(DefaultBodyLimit::max(ctx.cfg.request_body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_span))
        .with_state(ctx)
}
