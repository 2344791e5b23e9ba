use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use http::StatusCode;
use serde_json::Value;

use crate::application::request_context::RequestContext;

pub mod app_router;

#[derive(Debug, thiserror::Error)]
pub enum ProcedureError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProcedureError {
    pub fn code(&self) -> &'static str {
        match self {
            ProcedureError::Unauthorized => "UNAUTHORIZED",
            ProcedureError::BadRequest(_) => "BAD_REQUEST",
            ProcedureError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ProcedureError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProcedureError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProcedureError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProcedureError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProcedureError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

type Handler =
    Arc<dyn Fn(RequestContext, Value) -> BoxFuture<'static, Result<Value, ProcedureError>> + Send + Sync>;

#[derive(Clone)]
pub struct Procedure {
    name: String,
    summary: String,
    access: Access,
    handler: Handler,
}

impl Procedure {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub async fn invoke(&self, ctx: &RequestContext, input: Value) -> Result<Value, ProcedureError> {
        if self.access == Access::Protected && !ctx.is_authenticated() {
            return Err(ProcedureError::Unauthorized);
        }
        (self.handler)(ctx.clone(), input).await
    }
}

impl std::fmt::Debug for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("access", &self.access)
            .finish()
    }
}

/// Immutable registry of named procedures shared by the RPC and OpenAPI
/// transports.
#[derive(Debug, Clone, Default)]
pub struct ProcedureRouter {
    procedures: BTreeMap<String, Procedure>,
}

impl ProcedureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public<F, Fut>(self, name: &str, summary: &str, handler: F) -> Self
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProcedureError>> + Send + 'static,
    {
        self.register(name, summary, Access::Public, handler)
    }

    pub fn protected<F, Fut>(self, name: &str, summary: &str, handler: F) -> Self
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProcedureError>> + Send + 'static,
    {
        self.register(name, summary, Access::Protected, handler)
    }

    fn register<F, Fut>(mut self, name: &str, summary: &str, access: Access, handler: F) -> Self
    where
        F: Fn(RequestContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProcedureError>> + Send + 'static,
    {
        let name = name.trim_matches('/').to_string();
        let handler: Handler = Arc::new(move |ctx, input| handler(ctx, input).boxed());
        self.procedures.insert(
            name.clone(),
            Procedure {
                name,
                summary: summary.to_string(),
                access,
                handler,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name.trim_matches('/'))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}
