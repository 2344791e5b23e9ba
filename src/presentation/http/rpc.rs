use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Query, Request};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use serde_json::{Value, json};

use crate::application::dispatch::{Dispatch, DispatchStrategy, StrategyError};
use crate::application::procedures::{ProcedureError, ProcedureRouter};
use crate::application::request_context::RequestContext;
use crate::presentation::http::errors::DefinedError;

/// Procedure name addressed by `path` under `prefix`, if any.
pub(crate) fn procedure_name<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let name = path.strip_prefix(prefix)?.trim_matches('/');
    if name.is_empty() { None } else { Some(name) }
}

pub(crate) fn defined_error(err: &ProcedureError) -> DefinedError {
    DefinedError {
        defined: false,
        code: err.code().to_string(),
        status: err.status().as_u16(),
        message: err.to_string(),
    }
}

/// Reads and parses a JSON body; an empty body is `None`.
pub(crate) async fn read_json_body(
    body: Body,
    limit: usize,
) -> Result<Option<Value>, ProcedureError> {
    let bytes = to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            ProcedureError::PayloadTooLarge(limit)
        } else {
            ProcedureError::BadRequest(format!("unreadable request body: {inner}"))
        }
    })?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ProcedureError::BadRequest(format!("malformed JSON body: {e}")))
}

/// Serves procedures using the `{"json": ...}` envelope on both directions.
pub struct RpcStrategy {
    procedures: Arc<ProcedureRouter>,
    body_limit: usize,
}

impl RpcStrategy {
    pub fn new(procedures: Arc<ProcedureRouter>, body_limit: usize) -> Self {
        Self {
            procedures,
            body_limit,
        }
    }

    fn unwrap_envelope(value: Option<Value>) -> Result<Value, String> {
        match value {
            None => Ok(Value::Null),
            Some(Value::Object(mut map)) => Ok(map.remove("json").unwrap_or(Value::Null)),
            Some(_) => Err("expected an object envelope with a `json` field".into()),
        }
    }

    fn input_from_query(uri: &Uri) -> Result<Value, String> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map_err(|e| format!("malformed query string: {e}"))?;
        let envelope = match params.get("data") {
            Some(raw) => Some(
                serde_json::from_str(raw).map_err(|e| format!("malformed `data` parameter: {e}"))?,
            ),
            None => None,
        };
        Self::unwrap_envelope(envelope)
    }

    fn error_response(err: &ProcedureError) -> Response {
        (err.status(), Json(json!({ "json": defined_error(err) }))).into_response()
    }
}

#[async_trait]
impl DispatchStrategy for RpcStrategy {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn attempt(
        &self,
        req: Request,
        prefix: &str,
        ctx: &RequestContext,
    ) -> Result<Dispatch, StrategyError> {
        let method = req.method().clone();
        if method != Method::GET && method != Method::POST {
            return Ok(Dispatch::Unmatched(req));
        }
        let Some(procedure) =
            procedure_name(req.uri().path(), prefix).and_then(|n| self.procedures.get(n))
        else {
            return Ok(Dispatch::Unmatched(req));
        };

        let input = if method == Method::GET {
            Self::input_from_query(req.uri()).map_err(ProcedureError::BadRequest)
        } else {
            read_json_body(req.into_body(), self.body_limit)
                .await
                .and_then(|value| Self::unwrap_envelope(value).map_err(ProcedureError::BadRequest))
        };
        let input = match input {
            Ok(v) => v,
            Err(err) => return Ok(Dispatch::Matched(Self::error_response(&err))),
        };

        match procedure.invoke(ctx, input).await {
            Ok(output) => Ok(Dispatch::Matched(
                (StatusCode::OK, Json(json!({ "json": output }))).into_response(),
            )),
            Err(ProcedureError::Internal(e)) => {
                tracing::error!(procedure = procedure.name(), error = ?e, "rpc_handler_error");
                Err(StrategyError::new(self.name(), e))
            }
            Err(defined) => Ok(Dispatch::Matched(Self::error_response(&defined))),
        }
    }
}
