use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;
use tracing::Span;
use uuid::Uuid;

use crate::presentation::http::errors;

pub async fn log_request(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    tracing::debug!(
        %method,
        path = %path,
        origin = req.headers().get(header::ORIGIN).and_then(|v| v.to_str().ok()),
        "request_received"
    );

    let resp = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = resp.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "request_completed"
    );
    resp
}

/// A panic anywhere in the pipeline below becomes the 500 envelope instead
/// of a dropped connection.
pub async fn catch_panic(
    State(is_production): State<bool>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(path = %path, error = %message, "unhandled_error");
            errors::internal_error(&path, (!is_production).then_some(message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

pub fn make_span(req: &Request) -> Span {
    let request_id = Uuid::new_v4();
    tracing::info_span!(
        "http",
        method = %req.method(),
        uri = %req.uri(),
        %request_id
    )
}
