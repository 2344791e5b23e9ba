use axum::Json;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Body of every 404/500 produced by the pipeline itself.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub path: String,
}

pub fn not_found_response(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorEnvelope {
            error: "Not Found".into(),
            message: None,
            path: path.to_string(),
        }),
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    not_found_response(uri.path())
}

/// `detail` is only ever passed outside production.
pub fn internal_error(path: &str, detail: Option<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope {
            error: "Internal Server Error".into(),
            message: detail,
            path: path.to_string(),
        }),
    )
        .into_response()
}

/// Wire shape of a defined procedure or auth error.
#[derive(Debug, Serialize, ToSchema)]
pub struct DefinedError {
    pub defined: bool,
    pub code: String,
    pub status: u16,
    pub message: String,
}
