use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleReaderError {
    #[error("Failed to open sample file '{path}'")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("Malformed line {line} in '{path}': {reason}")]
    Malformed { path: PathBuf, line: usize, reason: String },

    #[error("Sample file '{path}' contains no samples")]
    Empty { path: PathBuf },
}
