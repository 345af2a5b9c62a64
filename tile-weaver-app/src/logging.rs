//! Logging setup for the application.

use crate::config::{AppConfig, GlobalLogLevel, ProgressLogLevel};
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the logger with the appropriate configuration based on the application settings.
///
/// The global level applies when `RUST_LOG` is unset; the progress module
/// always logs at `config.progress_log_level`.
pub fn init_logger(config: &AppConfig) {
    let progress_level = match config.progress_log_level {
        ProgressLogLevel::Trace => LevelFilter::Trace,
        ProgressLogLevel::Debug => LevelFilter::Debug,
        ProgressLogLevel::Info => LevelFilter::Info,
        ProgressLogLevel::Warn => LevelFilter::Warn,
    };

    let global_level = match config.global_log_level {
        GlobalLogLevel::Trace => LevelFilter::Trace,
        GlobalLogLevel::Debug => LevelFilter::Debug,
        GlobalLogLevel::Info => LevelFilter::Info,
        GlobalLogLevel::Warn => LevelFilter::Warn,
        GlobalLogLevel::Error => LevelFilter::Error,
    };

    let mut builder = Builder::new();
    builder.filter_level(global_level);
    // RUST_LOG directives override the global level.
    builder.parse_env(Env::default());
    builder.filter_module("tile_weaver_app::progress", progress_level);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        config.global_log_level,
        config.progress_log_level
    );
}
