use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrequencyReaderError {
    #[error("Failed to open frequency file '{path}'")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("Frequency file '{path}' lacks an 'Allele,<markers..>' header line")]
    MissingHeader { path: PathBuf },

    #[error("Malformed line {line} in '{path}': {reason}")]
    Malformed { path: PathBuf, line: usize, reason: String },
}
