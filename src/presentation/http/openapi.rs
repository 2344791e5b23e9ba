use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use tower::ServiceExt;
use utoipa::OpenApi;
use utoipa::openapi::path::{OperationBuilder, PathItem, PathItemType};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::{ContentBuilder, Object, ResponseBuilder, Schema};
use utoipa_swagger_ui::SwaggerUi;

use super::errors::{DefinedError, ErrorEnvelope};
use super::health::HealthResp;
use super::rpc::{defined_error, procedure_name, read_json_body};
use super::{auth, health};
use crate::application::dispatch::{Dispatch, DispatchStrategy, StrategyError};
use crate::application::procedures::{Access, ProcedureError, ProcedureRouter};
use crate::application::request_context::RequestContext;
use crate::domain::auth::session::{AuthSession, Session};
use crate::domain::auth::user::User;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::ok,
        health::health,
        auth::sign_up_email,
        auth::sign_in_email,
        auth::sign_out,
        auth::get_session,
        auth::ok,
    ),
    components(schemas(
        HealthResp,
        ErrorEnvelope,
        DefinedError,
        User,
        Session,
        AuthSession,
        auth::SignUpEmailRequest,
        auth::SignInEmailRequest,
        auth::SignedInResponse,
        auth::SignOutResponse,
        auth::OkResponse,
    )),
    tags(
        (name = "Health", description = "Liveness and store health"),
        (name = "Auth", description = "Email and password sessions"),
        (name = "Procedures", description = "Registered procedures, plain JSON in and out"),
    )
)]
pub struct ApiDoc;

/// Static document plus one `POST {prefix}/{name}` operation per procedure.
pub fn build_spec(procedures: &ProcedureRouter, prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    for procedure in procedures.iter() {
        let json_content = || {
            ContentBuilder::new()
                .schema(Schema::Object(Object::new()))
                .build()
        };
        let mut op = OperationBuilder::new()
            .operation_id(Some(procedure.name().replace('/', "_")))
            .summary(Some(procedure.summary()))
            .tag("Procedures")
            .request_body(Some(
                RequestBodyBuilder::new()
                    .content("application/json", json_content())
                    .build(),
            ))
            .response(
                "200",
                ResponseBuilder::new()
                    .description("Procedure output")
                    .content("application/json", json_content())
                    .build(),
            )
            .response(
                "400",
                ResponseBuilder::new()
                    .description("Malformed input")
                    .build(),
            );
        if procedure.access() == Access::Protected {
            op = op.response(
                "401",
                ResponseBuilder::new()
                    .description("No live session")
                    .build(),
            );
        }
        doc.paths.paths.insert(
            format!("{prefix}/{}", procedure.name()),
            PathItem::new(PathItemType::Post, op.build()),
        );
    }
    doc
}

/// Interactive reference: Swagger UI, the generated document, and plain
/// JSON procedure calls, all under one prefix.
pub struct OpenApiStrategy {
    procedures: Arc<ProcedureRouter>,
    docs: Router,
    body_limit: usize,
}

impl OpenApiStrategy {
    pub fn new(procedures: Arc<ProcedureRouter>, prefix: &str, body_limit: usize) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let spec = build_spec(&procedures, prefix);
        let docs = Router::new().merge(
            SwaggerUi::new(format!("{prefix}/docs")).url(format!("{prefix}/spec.json"), spec),
        );
        Self {
            procedures,
            docs,
            body_limit,
        }
    }

    fn error_response(err: &ProcedureError) -> Response {
        (err.status(), Json(defined_error(err))).into_response()
    }
}

#[async_trait]
impl DispatchStrategy for OpenApiStrategy {
    fn name(&self) -> &'static str {
        "openapi"
    }

    async fn attempt(
        &self,
        req: Request,
        prefix: &str,
        ctx: &RequestContext,
    ) -> Result<Dispatch, StrategyError> {
        let path = req.uri().path();
        let rest = path.strip_prefix(prefix).unwrap_or_default();
        let is_get = req.method() == Method::GET;

        if is_get && (rest.is_empty() || rest == "/") {
            return Ok(Dispatch::Matched(
                Redirect::temporary(&format!("{prefix}/docs/")).into_response(),
            ));
        }
        if is_get && (rest == "/spec.json" || rest == "/docs" || rest.starts_with("/docs/")) {
            return match self.docs.clone().oneshot(req).await {
                Ok(resp) => Ok(Dispatch::Matched(resp)),
                Err(never) => match never {},
            };
        }

        if req.method() != Method::POST {
            return Ok(Dispatch::Unmatched(req));
        }
        let Some(procedure) = procedure_name(path, prefix).and_then(|n| self.procedures.get(n))
        else {
            return Ok(Dispatch::Unmatched(req));
        };

        let input = match read_json_body(req.into_body(), self.body_limit).await {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => return Ok(Dispatch::Matched(Self::error_response(&err))),
        };
        match procedure.invoke(ctx, input).await {
            Ok(output) => Ok(Dispatch::Matched((StatusCode::OK, Json(output)).into_response())),
            Err(ProcedureError::Internal(e)) => {
                tracing::error!(procedure = procedure.name(), error = ?e, "openapi_handler_error");
                Err(StrategyError::new(self.name(), e))
            }
            Err(defined) => Ok(Dispatch::Matched(Self::error_response(&defined))),
        }
    }
}
