use tracing_subscriber::EnvFilter;

use crate::bootstrap::config::Config;

/// Default filter when `RUST_LOG` is unset: the crate at `LOG_LEVEL`,
/// framework crates at info.
pub fn default_directives(log_level: &str) -> String {
    format!(
        "{}={log_level},tower_http=info,axum=info,sqlx=warn",
        env!("CARGO_CRATE_NAME")
    )
}

pub fn init(cfg: &Config) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directives(&cfg.log_level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if cfg.is_production {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(true).try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        log_level = %cfg.log_level,
        environment = %cfg.environment,
        "logger_initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("server=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
