//! Probability-computation engine for forensic DNA mixture interpretation.
//!
//! Given one or more observed replicate profiles and two competing
//! hypotheses about who contributed to the mixture, this crate computes the
//! likelihood ratio of the replicate data under each hypothesis: candidate
//! genotypes for unknown contributors are enumerated combinatorially,
//! weighted by population-genetics models (Hardy-Weinberg, theta-corrected,
//! and kinship-specific), priced against every replicate through an allele
//! dropout/drop-in model, and aggregated per locus on a worker pool.

pub mod cancellation;
pub mod config;
pub mod contributor;
pub mod hypothesis;
pub mod calculators;
pub mod permutations;
pub mod jobs;
pub mod results;
pub mod scheduler;

pub use cancellation::CancellationToken;
pub use config::AnalysisConfig;
pub use contributor::Contributor;
pub use hypothesis::{Hypothesis, Relation, Relatedness};
pub use results::{LikelihoodRatio, LocusProbabilities, LocusProbability, Ratio};
pub use scheduler::{AnalysisOutcome, AnalysisState, ProgressListener, Scheduler, Side};
