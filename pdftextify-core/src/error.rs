use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("{0} not found in PATH")]
    ExecutableNotFound(String),

    #[error("Subprocess error: {0}")]
    Spawn(std::io::Error),

    #[error("Subprocess error: timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The tool exited unsuccessfully or produced no output file.
    /// `code` is `None` when the process was terminated by a signal.
    #[error("OCR failed: {detail}")]
    Failed { code: Option<i32>, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output type: {0}")]
    InvalidOutputType(String),
}

pub type Result<T> = std::result::Result<T, OcrError>;
