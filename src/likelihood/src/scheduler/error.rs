use thiserror::Error;

use crate::jobs::ConfigError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Analysis failed: {0}")]
    Failed(String),

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("An analysis is already running")]
    AlreadyRunning,

    #[error("No analysis was started")]
    NotStarted,
}
