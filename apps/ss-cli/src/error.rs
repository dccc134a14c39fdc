use ss_controls::ControlError;
use ss_project::ProjectError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Model error: {0}")]
    Project(#[from] ProjectError),

    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    #[error("Bad input data in {path} at line {line}: {what}")]
    InputData {
        path: PathBuf,
        line: usize,
        what: String,
    },

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
