//! Tracing subscriber for the CLI
//!
//! Logs go to stderr; stdout is reserved for command output such as
//! prediction rows and model listings.

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// HTTP internals only log at warn unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "h2=warn"];

/// Filter from `RUST_LOG` when set, else the configured level with HTTP noise quieted
fn build_filter(level: &str, env_override: Option<&str>) -> anyhow::Result<EnvFilter> {
    if let Some(directives) = env_override.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(directives).with_context(|| {
            format!("Invalid {} directives '{}'", EnvFilter::DEFAULT_ENV, directives)
        });
    }

    let directives = std::iter::once(level)
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",");

    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid logging level '{}'", level))
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.level, env.as_deref())?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("Logging already initialized")?;

    tracing::debug!(level = %config.level, "Logging initialized");
    Ok(())
}
