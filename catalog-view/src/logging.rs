//! Logging Infrastructure
//!
//! `tracing` subscriber setup for embedders of the catalog view. Safe to call
//! more than once; later calls leave the first subscriber in place.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::CatalogConfig;

/// Initialize the logger at `info` on stdout
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger from configuration
///
/// Keep the returned guard alive while logging to a file, otherwise
/// buffered lines are lost on shutdown.
pub fn init_from_config(config: &CatalogConfig) -> Option<WorkerGuard> {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref())
}

/// Initialize the logger with optional daily-rolling file output
///
/// `log_level` is an env-filter directive ("debug", "catalog_view=trace", ...);
/// `RUST_LOG` wins when set.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && Path::new(dir).is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "catalog-view");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        if builder.with_ansi(false).with_writer(writer).try_init().is_err() {
            tracing::debug!("Logger already initialized");
        }
        return Some(guard);
    }

    if builder.try_init().is_err() {
        tracing::debug!("Logger already initialized");
    }
    None
}
