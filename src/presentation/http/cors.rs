use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bunner_cors_rs::constants::header;
use bunner_cors_rs::{
    Cors, CorsDecision, Headers, PreflightRejectionReason, RequestContext, SimpleRejectionReason,
};

pub async fn apply_cors(State(cors): State<Arc<Cors>>, req: Request, next: Next) -> Response {
    let owned = OwnedRequestContext::from_request(&req);

    match cors.check(&owned.as_request_context()) {
        Ok(CorsDecision::PreflightAccepted { headers }) => {
            with_headers(StatusCode::NO_CONTENT.into_response(), &headers)
        }
        Ok(CorsDecision::PreflightRejected(rejection)) => {
            tracing::debug!(reason = ?rejection.reason, "cors_preflight_rejected");
            let message = preflight_rejection_message(&rejection.reason);
            with_headers(
                (StatusCode::FORBIDDEN, message).into_response(),
                &rejection.headers,
            )
        }
        Ok(CorsDecision::SimpleAccepted { headers }) => {
            with_headers(next.run(req).await, &headers)
        }
        Ok(CorsDecision::SimpleRejected(rejection)) => {
            let message = match rejection.reason {
                SimpleRejectionReason::OriginNotAllowed => "origin not allowed",
            };
            with_headers(
                (StatusCode::FORBIDDEN, message).into_response(),
                &rejection.headers,
            )
        }
        Ok(CorsDecision::NotApplicable) => next.run(req).await,
        Err(e) => {
            tracing::error!(error = %e, "cors_check_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn with_headers(mut resp: Response, headers: &Headers) -> Response {
    write_headers(resp.headers_mut(), headers);
    resp
}

fn write_headers(map: &mut HeaderMap, headers: &Headers) {
    for (name, value) in headers.iter() {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "cors_header_not_representable"),
        }
    }
}

fn preflight_rejection_message(reason: &PreflightRejectionReason) -> String {
    match reason {
        PreflightRejectionReason::OriginNotAllowed => "origin not allowed".into(),
        PreflightRejectionReason::MethodNotAllowed { requested_method } => {
            format!("method '{requested_method}' not allowed")
        }
        PreflightRejectionReason::HeadersNotAllowed { requested_headers } => {
            format!("headers '{requested_headers}' not allowed")
        }
    }
}

struct OwnedRequestContext {
    method: String,
    origin: Option<String>,
    request_method: Option<String>,
    request_headers: Option<String>,
    request_private_network: bool,
}

impl OwnedRequestContext {
    fn from_request(req: &Request) -> Self {
        let headers = req.headers();
        Self {
            method: req.method().as_str().to_string(),
            origin: header_value(headers, header::ORIGIN),
            request_method: header_value(headers, header::ACCESS_CONTROL_REQUEST_METHOD),
            request_headers: header_value(headers, header::ACCESS_CONTROL_REQUEST_HEADERS),
            request_private_network: headers
                .get(header::ACCESS_CONTROL_REQUEST_PRIVATE_NETWORK)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        }
    }

    fn as_request_context(&self) -> RequestContext<'_> {
        RequestContext {
            method: &self.method,
            origin: self.origin.as_deref(),
            access_control_request_method: self.request_method.as_deref(),
            access_control_request_headers: self.request_headers.as_deref(),
            access_control_request_private_network: self.request_private_network,
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
