use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{error, info};

use server::application::cors::CorsPolicy;
use server::application::dispatch::DispatchChain;
use server::application::ports::session_repository::SessionRepository;
use server::application::ports::user_repository::UserRepository;
use server::application::procedures::app_router::app_router;
use server::application::request_context::ContextBuilder;
use server::application::services::auth::TokenSessionLookup;
use server::application::use_cases::auth::sweep_sessions::SweepExpiredSessions;
use server::bootstrap::app_context::{AppContext, AppServices};
use server::bootstrap::config::Config;
use server::bootstrap::logging;
use server::infrastructure::db::repositories::session_repository_sqlx::SqlxSessionRepository;
use server::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;
use server::infrastructure::db::{self, PgStoreHealth};
use server::presentation::http::auth::{AuthRoutes, AuthState};
use server::presentation::http::dispatch::{API_REFERENCE_PREFIX, AUTH_PREFIX, RPC_PREFIX};
use server::presentation::http::openapi::OpenApiStrategy;
use server::presentation::http::rpc::RpcStrategy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = Config::from_env()?;
    logging::init(&cfg)?;
    info!(
        port = cfg.port,
        environment = %cfg.environment,
        origins = ?cfg.allowed_origins.as_slice(),
        "Starting server"
    );

    // Database
    let pool = db::connect_pool(&cfg.database_url)?;
    if let Err(e) = db::migrate(&pool).await {
        // Keep serving public routes; session lookups degrade to anonymous.
        tracing::warn!(error = ?e, "migrations_failed");
    }

    let user_repo: Arc<dyn UserRepository> = Arc::new(SqlxUserRepository::new(pool.clone()));
    let session_repo: Arc<dyn SessionRepository> =
        Arc::new(SqlxSessionRepository::new(pool.clone()));

    let session_lookup = Arc::new(TokenSessionLookup::new(
        user_repo.clone(),
        session_repo.clone(),
    ));
    let context_builder = ContextBuilder::new(session_lookup, cfg.session_fetch_timeout);

    let procedures = Arc::new(app_router());
    let dispatch_chain = DispatchChain::new()
        .with_strategy(
            RPC_PREFIX,
            Arc::new(RpcStrategy::new(
                procedures.clone(),
                cfg.request_body_limit,
            )),
        )
        .with_strategy(
            API_REFERENCE_PREFIX,
            Arc::new(OpenApiStrategy::new(
                procedures.clone(),
                API_REFERENCE_PREFIX,
                cfg.request_body_limit,
            )),
        );
    info!(
        procedures = procedures.len(),
        prefixes = ?dispatch_chain.prefixes().collect::<Vec<_>>(),
        "dispatch_chain_ready"
    );

    let auth_routes = AuthRoutes::new(
        AUTH_PREFIX,
        AuthState::new(
            user_repo.clone(),
            session_repo.clone(),
            cfg.session_expires_secs,
            cfg.secure_cookies(),
        ),
    );
    let cors = Arc::new(
        CorsPolicy::new(cfg.allowed_origins.clone(), cfg.cors_fallback).into_cors()?,
    );

    let services = AppServices::new(
        context_builder,
        dispatch_chain,
        Arc::new(auth_routes),
        cors,
        Arc::new(PgStoreHealth::new(pool.clone())),
    );
    let ctx = AppContext::new(cfg.clone(), services);
    let app = server::presentation::http::router(ctx);

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    info!(%api_addr, "HTTP server listening");

    let api_handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    });

    // Background expired-session sweep
    let sweep_handle: JoinHandle<anyhow::Result<()>> = {
        let sessions = session_repo.clone();
        let interval = Duration::from_secs(cfg.session_sweep_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let uc = SweepExpiredSessions {
                    sessions: sessions.as_ref(),
                };
                if let Err(e) = uc.execute().await {
                    tracing::error!(error = ?e, "session_sweep_failed");
                }
            }
        })
    };

    match api_handle.await {
        Ok(Ok(())) => info!("HTTP server stopped"),
        Ok(Err(e)) => error!(?e, "HTTP server task failed"),
        Err(e) => error!(?e, "HTTP server task panicked"),
    }

    sweep_handle.abort();
    if let Err(e) = sweep_handle.await {
        if !e.is_cancelled() {
            error!(?e, "Session sweep task panicked");
        }
    }
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "ctrl_c_handler_failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(?e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown_signal_received");
}
