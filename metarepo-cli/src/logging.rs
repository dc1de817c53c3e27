//! Tracing initialization: console output plus an optional log file.

use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggerConfig;

pub fn init(config: &LoggerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid logger level {:?}", config.level))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match &config.file_name {
        Some(file_name) => {
            let file = File::create(file_name)
                .with_context(|| format!("Unable to open log file {file_name}"))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}
