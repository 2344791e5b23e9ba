use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use utoipa::ToSchema;

use crate::application::ports::auth_handler::AuthHandler;
use crate::application::ports::session_repository::{SessionOrigin, SessionRepository};
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::auth::{
    build_session_cookie, clear_session_cookie, session_token_from_headers,
};
use crate::application::use_cases::auth::AuthError;
use crate::application::use_cases::auth::get_session::GetSession;
use crate::application::use_cases::auth::sign_in::{SignIn, SignInRequest};
use crate::application::use_cases::auth::sign_out::SignOut;
use crate::application::use_cases::auth::sign_up::{SignUp, SignUpRequest};
use crate::domain::auth::session::AuthSession;
use crate::domain::auth::user::User;
use crate::presentation::http::errors::{self, DefinedError};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpEmailRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInEmailRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedInResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignOutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Clone)]
pub struct AuthState {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_expires_secs: i64,
    secure_cookies: bool,
}

impl AuthState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        session_expires_secs: i64,
        secure_cookies: bool,
    ) -> Self {
        Self {
            users,
            sessions,
            session_expires_secs,
            secure_cookies,
        }
    }

    fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_expires_secs)
    }
}

pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/sign-up/email", post(sign_up_email))
        .route("/sign-in/email", post(sign_in_email))
        .route("/sign-out", post(sign_out))
        .route("/get-session", get(get_session))
        .route("/ok", get(ok))
        .with_state(state)
}

/// The mounted `/api/auth` router, answering whatever the pipeline hands it.
/// Unknown auth paths get the outer 404 envelope with the full path.
pub struct AuthRoutes {
    router: Router,
}

impl AuthRoutes {
    pub fn new(prefix: &str, state: AuthState) -> Self {
        Self {
            router: Router::new()
                .nest(prefix, routes(state))
                .fallback(errors::not_found),
        }
    }
}

#[async_trait]
impl AuthHandler for AuthRoutes {
    async fn handle(&self, req: Request) -> Response {
        match self.router.clone().oneshot(req).await {
            Ok(resp) => resp,
            Err(never) => match never {},
        }
    }
}

fn auth_error_response(err: AuthError) -> Response {
    if let AuthError::Internal(e) = &err {
        tracing::error!(error = ?e, "auth_handler_error");
    }
    let body = DefinedError {
        defined: true,
        code: err.code().to_string(),
        status: err.status().as_u16(),
        message: match &err {
            AuthError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        },
    };
    (err.status(), Json(body)).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    auth_error_response(AuthError::InvalidInput(rejection.body_text()))
}

fn with_cookie(mut resp: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(v) => {
            resp.headers_mut().insert(header::SET_COOKIE, v);
        }
        Err(e) => tracing::warn!(error = %e, "session_cookie_not_a_header_value"),
    }
    resp
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn session_origin(headers: &HeaderMap) -> SessionOrigin {
    let ip_address = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| header_str(headers, "x-real-ip").map(str::to_string));
    SessionOrigin {
        ip_address,
        user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_string),
    }
}

fn signed_in_response(state: &AuthState, token: String, user: User) -> Response {
    let cookie = build_session_cookie(&token, state.session_expires_secs, state.secure_cookies);
    with_cookie(
        (StatusCode::OK, Json(SignedInResponse { token, user })).into_response(),
        cookie,
    )
}

#[utoipa::path(post, path = "/api/auth/sign-up/email", tag = "Auth", request_body = SignUpEmailRequest, responses(
    (status = 200, body = SignedInResponse),
    (status = 400, body = DefinedError),
    (status = 422, body = DefinedError)
))]
pub async fn sign_up_email(
    State(state): State<AuthState>,
    headers: HeaderMap,
    payload: Result<Json<SignUpEmailRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejection_response(rejection),
    };
    let uc = SignUp {
        users: state.users.as_ref(),
        sessions: state.sessions.as_ref(),
        session_ttl: state.session_ttl(),
    };
    let req = SignUpRequest {
        name: body.name,
        email: body.email,
        password: body.password,
        origin: session_origin(&headers),
    };
    match uc.execute(&req).await {
        Ok(signed_in) => signed_in_response(&state, signed_in.token, signed_in.user),
        Err(err) => auth_error_response(err),
    }
}

#[utoipa::path(post, path = "/api/auth/sign-in/email", tag = "Auth", request_body = SignInEmailRequest, responses(
    (status = 200, body = SignedInResponse),
    (status = 401, body = DefinedError)
))]
pub async fn sign_in_email(
    State(state): State<AuthState>,
    headers: HeaderMap,
    payload: Result<Json<SignInEmailRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejection_response(rejection),
    };
    let uc = SignIn {
        users: state.users.as_ref(),
        sessions: state.sessions.as_ref(),
        session_ttl: state.session_ttl(),
    };
    let req = SignInRequest {
        email: body.email,
        password: body.password,
        origin: session_origin(&headers),
    };
    match uc.execute(&req).await {
        Ok(signed_in) => signed_in_response(&state, signed_in.token, signed_in.user),
        Err(err) => auth_error_response(err),
    }
}

#[utoipa::path(post, path = "/api/auth/sign-out", tag = "Auth", responses(
    (status = 200, body = SignOutResponse)
))]
pub async fn sign_out(State(state): State<AuthState>, headers: HeaderMap) -> Response {
    let token = session_token_from_headers(&headers);
    let uc = SignOut {
        sessions: state.sessions.as_ref(),
    };
    if let Err(e) = uc.execute(token.as_deref()).await {
        return auth_error_response(AuthError::Internal(e));
    }
    with_cookie(
        Json(SignOutResponse { success: true }).into_response(),
        clear_session_cookie(state.secure_cookies),
    )
}

/// Current session or JSON `null`.
#[utoipa::path(get, path = "/api/auth/get-session", tag = "Auth", responses(
    (status = 200, body = AuthSession, description = "`null` when no live session")
))]
pub async fn get_session(State(state): State<AuthState>, headers: HeaderMap) -> Response {
    let Some(token) = session_token_from_headers(&headers) else {
        return Json(None::<AuthSession>).into_response();
    };
    let uc = GetSession {
        users: state.users.as_ref(),
        sessions: state.sessions.as_ref(),
    };
    match uc.execute(&token).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => auth_error_response(AuthError::Internal(e)),
    }
}

#[utoipa::path(get, path = "/api/auth/ok", operation_id = "auth_ok", tag = "Auth", responses((status = 200, body = OkResponse)))]
pub async fn ok() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}
