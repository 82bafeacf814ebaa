mod error;
pub use error::ContributorError;

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use profile::Sample;

/// A known individual under a hypothesis, with a personal dropout parameter.
///
/// The four conditional sub-probabilities are derived from `d` on
/// construction and re-derived whenever `d` changes; copies re-derive them
/// from the copied `d` rather than copying the sub-values.
#[derive(Debug)]
pub struct Contributor {
    sample : Arc<Sample>,
    dropout: f64,
    present_once               : f64,
    present_once_homozygote    : f64,
    present_multiple           : f64,
    present_multiple_homozygote: f64,
}

impl Contributor {
    pub fn new(sample: Arc<Sample>, dropout: f64) -> Result<Self, ContributorError> {
        Self::check_dropout(dropout)?;
        Ok(Self::derive(sample, dropout))
    }

    fn check_dropout(dropout: f64) -> Result<(), ContributorError> {
        if !(0.0..=1.0).contains(&dropout) || dropout.is_nan() {
            return Err(ContributorError::InvalidDropout(dropout));
        }
        Ok(())
    }

    fn derive(sample: Arc<Sample>, dropout: f64) -> Self {
        Self {
            sample,
            dropout,
            present_once               : 1.0 - dropout,
            present_once_homozygote    : 1.0 - dropout * dropout,
            present_multiple           : dropout,
            present_multiple_homozygote: dropout * dropout,
        }
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    pub fn dropout(&self) -> f64 {
        self.dropout
    }

    pub fn set_dropout(&mut self, dropout: f64) -> Result<(), ContributorError> {
        Self::check_dropout(dropout)?;
        *self = Self::derive(Arc::clone(&self.sample), dropout);
        Ok(())
    }

    /// Probability that a heterozygous allele carried by this contributor
    /// alone is seen in a replicate.
    pub fn present_once(&self) -> f64 {
        self.present_once
    }

    pub fn present_once_homozygote(&self) -> f64 {
        self.present_once_homozygote
    }

    pub fn present_multiple(&self) -> f64 {
        self.present_multiple
    }

    pub fn present_multiple_homozygote(&self) -> f64 {
        self.present_multiple_homozygote
    }

    /// Probability that every copy of an allele carried by this contributor
    /// drops out of a replicate, homozygote-aware.
    pub fn dropout_probability(&self, homozygote: bool) -> f64 {
        if homozygote { self.present_multiple_homozygote } else { self.present_multiple }
    }
}

impl Clone for Contributor {
    fn clone(&self) -> Self {
        // Re-derive from `d`: the sub-probabilities are never copied.
        Self::derive(Arc::clone(&self.sample), self.dropout)
    }
}

impl Display for Contributor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (d={})", self.sample.id(), self.dropout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(dropout: f64) -> Contributor {
        Contributor::new(Arc::new(Sample::new("suspect-1")), dropout).unwrap()
    }

    #[test]
    fn sub_probabilities_are_derived_from_d() {
        let contributor = contributor(0.1);
        assert!((contributor.present_once() - 0.9).abs() < 1e-3);
        assert!((contributor.present_once_homozygote() - 0.99).abs() < 1e-3);
        assert!((contributor.present_multiple() - 0.1).abs() < 1e-3);
        assert!((contributor.present_multiple_homozygote() - 0.01).abs() < 1e-3);
    }

    #[test]
    fn set_dropout_rederives() {
        let mut contributor = contributor(0.1);
        contributor.set_dropout(0.3).unwrap();
        assert!((contributor.present_once() - 0.7).abs() < 1e-12);
        assert!((contributor.present_multiple_homozygote() - 0.09).abs() < 1e-12);
    }

    #[test]
    fn clones_rederive_from_d() {
        let original = contributor(0.25);
        let copy = original.clone();
        assert!((copy.present_once_homozygote() - (1.0 - 0.25 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_dropout_is_rejected() {
        assert!(Contributor::new(Arc::new(Sample::new("s")), 1.5).is_err());
        assert!(contributor(0.0).set_dropout(-0.1).is_err());
    }
}
