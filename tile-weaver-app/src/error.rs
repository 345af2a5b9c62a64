use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::LoadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule Loading Error: {0}")]
    Load(#[from] LoadError),

    #[error("WFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    #[error("WFC could not find a valid assignment")]
    Failed,

    #[error("WFC run was cancelled")]
    Cancelled,

    #[error("Solver thread panicked")]
    WorkerPanicked,

    #[error("Failed to save output: {0}")]
    SaveError(anyhow::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
