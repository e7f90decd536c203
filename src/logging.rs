//! Logging setup.
//!
//! The terminal belongs to the TUI, so log records go to a file when one is
//! configured and are discarded otherwise. Format: `LEVEL target: message`
//! without ANSI colors.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Install the global subscriber. Appends to `log_file` when given.
pub fn init(log_file: Option<&Path>, level: LogLevel) -> std::io::Result<()> {
    let Some(path) = log_file else {
        // Nothing would be written anyway; skip installing a subscriber.
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = LevelFilter::from_level(level.into());

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .with_filter(filter);

    // Ignore a second init (tests, embedding): the first subscriber wins.
    let _ = Registry::default().with(layer).try_init();
    tracing::info!(path = %path.display(), ?level, "logging initialized");
    Ok(())
}
