use std::sync::Arc;

use bunner_cors_rs::Cors;

use crate::application::dispatch::DispatchChain;
use crate::application::ports::auth_handler::AuthHandler;
use crate::application::ports::store_health::StoreHealth;
use crate::application::request_context::ContextBuilder;
use crate::bootstrap::config::Config;

/// Everything the request pipeline needs, built once at start-up and shared
/// read-only by all requests.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    context_builder: ContextBuilder,
    dispatch_chain: DispatchChain,
    auth_handler: Arc<dyn AuthHandler>,
    cors: Arc<Cors>,
    store_health: Arc<dyn StoreHealth>,
}

impl AppServices {
    pub fn new(
        context_builder: ContextBuilder,
        dispatch_chain: DispatchChain,
        auth_handler: Arc<dyn AuthHandler>,
        cors: Arc<Cors>,
        store_health: Arc<dyn StoreHealth>,
    ) -> Self {
        Self {
            context_builder,
            dispatch_chain,
            auth_handler,
            cors,
            store_health,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn context_builder(&self) -> &ContextBuilder {
        &self.services.context_builder
    }

    pub fn dispatch_chain(&self) -> &DispatchChain {
        &self.services.dispatch_chain
    }

    pub fn auth_handler(&self) -> Arc<dyn AuthHandler> {
        self.services.auth_handler.clone()
    }

    pub fn cors(&self) -> Arc<Cors> {
        self.services.cors.clone()
    }

    pub fn store_health(&self) -> Arc<dyn StoreHealth> {
        self.services.store_health.clone()
    }
}
