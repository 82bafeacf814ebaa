use thiserror::Error;

use profile::locus::LocusError;

use crate::calculators::CalculatorError;
use crate::cancellation::Cancelled;

/// Configuration defects, detected synchronously before any job is
/// scheduled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Contributor sample '{sample}' lacks locus '{locus}' required by hypothesis '{hypothesis}'")]
    MissingLocus { hypothesis: String, sample: String, locus: String },

    #[error("Neither hypothesis side is configured")]
    NoHypotheses,

    #[error("No enabled replicate samples were provided")]
    NoReplicates,

    #[error("No loci are enabled for analysis")]
    NoLoci,

    #[error("Worker-pool size must be at least 1")]
    InvalidThreadCount,

    #[error(transparent)]
    Locus(#[from] LocusError),

    #[error(transparent)]
    Calculator(#[from] CalculatorError),
}

/// Failures surfaced by a running job through its result handle.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Calculator(#[from] CalculatorError),
}
