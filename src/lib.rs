// Module layout (Clean Architecture style)
// - bootstrap: configuration, logging and startup wiring
// - infrastructure: Postgres session store adapters
// - presentation: HTTP pipeline, dispatch strategies and auth routes
// - application: request context, dispatch chain, procedures and use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
mod test_support;
