//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

fn filter(default_level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_level)?),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(default_level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = filter(default_level)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true).with_current_span(true))
            .try_init()?,
    }
    Ok(())
}
