use serde_json::{Value, json};

use super::{ProcedureError, ProcedureRouter};
use crate::application::request_context::RequestContext;

pub fn app_router() -> ProcedureRouter {
    ProcedureRouter::new()
        .public("healthCheck", "Liveness check", health_check)
        .protected(
            "privateData",
            "Returns data visible only to signed-in users",
            private_data,
        )
}

async fn health_check(_ctx: RequestContext, _input: Value) -> Result<Value, ProcedureError> {
    Ok(json!("OK"))
}

async fn private_data(ctx: RequestContext, _input: Value) -> Result<Value, ProcedureError> {
    let session = ctx.session().ok_or(ProcedureError::Unauthorized)?;
    Ok(json!({
        "message": "This is private",
        "user": session.user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_answers_ok() {
        let out = app_router()
            .get("healthCheck")
            .unwrap()
            .invoke(&RequestContext::anonymous(), Value::Null)
            .await
            .unwrap();
        assert_eq!(out, json!("OK"));
    }

    #[tokio::test]
    async fn private_data_requires_a_session() {
        let err = app_router()
            .get("privateData")
            .unwrap()
            .invoke(&RequestContext::anonymous(), Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcedureError::Unauthorized));
    }
}
