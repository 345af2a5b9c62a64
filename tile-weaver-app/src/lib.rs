//! Tile Weaver Application Library
//!
//! Configuration, setup and output handling for the `tile-weaver` binary.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;
pub mod visualization;

pub use config::AppConfig;
pub use error::AppError;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Application entry point.
///
/// Malformed flags and `--help` exit directly through clap.
pub fn main() -> anyhow::Result<()> {
    let config = match AppConfig::load(std::env::args_os()) {
        Ok(config) => config,
        Err(AppError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    logging::init_logger(&config);
    log::info!("Tile Weaver Starting");
    log::debug!("Loaded Config: {:?}", config);

    let shutdown_signal = Arc::new(AtomicBool::new(false));
    setup::execution::run_standard_mode(&config, shutdown_signal)?;

    log::info!("Tile Weaver Finished.");
    Ok(())
}
