use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

use crate::application::request_context::RequestContext;

/// Result of one strategy attempt. An unmatched attempt hands the request
/// back untouched so the next stage can take it.
#[derive(Debug)]
pub enum Dispatch {
    Matched(Response),
    Unmatched(Request),
}

#[derive(Debug, thiserror::Error)]
#[error("{strategy} strategy failed: {error}")]
pub struct StrategyError {
    pub strategy: &'static str,
    pub error: anyhow::Error,
}

impl StrategyError {
    pub fn new(strategy: &'static str, error: impl Into<anyhow::Error>) -> Self {
        Self {
            strategy,
            error: error.into(),
        }
    }
}

#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called only for requests whose path lies under `prefix`.
    async fn attempt(
        &self,
        req: Request,
        prefix: &str,
        ctx: &RequestContext,
    ) -> Result<Dispatch, StrategyError>;
}

/// `true` when `path` is `prefix` itself or lies below it.
pub fn in_scope(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

struct Stage {
    prefix: String,
    strategy: Arc<dyn DispatchStrategy>,
}

/// Ordered strategies tried one after another; the first match wins.
#[derive(Default)]
pub struct DispatchChain {
    stages: Vec<Stage>,
}

impl DispatchChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, prefix: &str, strategy: Arc<dyn DispatchStrategy>) -> Self {
        self.stages.push(Stage {
            prefix: prefix.trim_end_matches('/').to_string(),
            strategy,
        });
        self
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.prefix.as_str())
    }

    pub async fn dispatch(
        &self,
        mut req: Request,
        ctx: &RequestContext,
    ) -> Result<Dispatch, StrategyError> {
        for stage in &self.stages {
            if !in_scope(req.uri().path(), &stage.prefix) {
                continue;
            }
            let path = req.uri().path().to_owned();
            match stage.strategy.attempt(req, &stage.prefix, ctx).await? {
                Dispatch::Matched(resp) => {
                    tracing::info!(
                        strategy = stage.strategy.name(),
                        path = %path,
                        status = resp.status().as_u16(),
                        "handler_matched"
                    );
                    return Ok(Dispatch::Matched(resp));
                }
                Dispatch::Unmatched(back) => req = back,
            }
        }
        Ok(Dispatch::Unmatched(req))
    }
}
