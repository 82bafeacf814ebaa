mod error;
mod related;
mod unrelated;

pub use error::CalculatorError;
pub use related::RelatedCalculator;
pub use unrelated::{HardyWeinbergCalculator, ThetaCorrectedCalculator};

use std::sync::Arc;

use popstats::PopulationStatistics;
use profile::{Allele, Locus};

/// Per-allele occurrence counts accumulated across the unknown contributors
/// already considered within one genotype assignment.
///
/// Under the coancestry correction the probability of drawing an allele
/// depends on how many prior copies have been "used": later unknowns see a
/// population enriched by earlier unknowns' alleles.
#[derive(Debug, Default)]
pub struct RunningAlleleCounts {
    counts: Vec<u32>,
    total : u32,
}

impl RunningAlleleCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, allele_id: u32) -> u32 {
        self.counts.get(allele_id as usize).copied().unwrap_or(0)
    }

    pub fn record(&mut self, allele_id: u32) {
        let index = allele_id as usize;
        if self.counts.len() <= index {
            self.counts.resize(index + 1, 0);
        }
        self.counts[index] += 1;
        self.total += 1;
    }

    /// Total number of alleles drawn so far.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|count| *count = 0);
        self.total = 0;
    }
}

/// Per-draw denominator of the coancestry-corrected sampling formula, for a
/// draw made after `prior` alleles have already been observed. Accumulated
/// by the locus probability job across all unknown allele draws.
pub fn theta_denominator(prior: u32, theta: f64) -> f64 {
    1.0 + (f64::from(prior) - 1.0) * theta
}

/// Probability model for one unknown contributor's candidate genotype.
///
/// `counts` carries the allele draws of previously considered unknowns and
/// is updated with the candidate's alleles. Implementations return the
/// numerator of their sampling formula; normalizing denominators are either
/// internal (kinship models) or accumulated by the caller through
/// [`theta_denominator`] (urn-style unrelated draws).
pub trait GenotypeProbabilityCalculator {
    fn calculate(&mut self, counts: &mut RunningAlleleCounts, candidate: &Locus) -> Result<f64, CalculatorError>;
}

/// Pick the unrelated-model calculator matching the hypothesis' theta.
pub fn unrelated_calculator(
    statistics: Arc<PopulationStatistics>,
    theta: f64,
    validation: bool,
) -> Box<dyn GenotypeProbabilityCalculator + Send> {
    if theta == 0.0 {
        Box::new(HardyWeinbergCalculator::new(statistics, validation))
    } else {
        Box::new(ThetaCorrectedCalculator::new(statistics, theta, validation))
    }
}

/// A candidate genotype always carries exactly two alleles.
pub(crate) fn genotype_alleles(candidate: &Locus) -> Result<(&Allele, &Allele), CalculatorError> {
    match candidate.alleles() {
        [first, second] => Ok((first, second)),
        alleles => Err(CalculatorError::MalformedGenotype {
            locus: candidate.name().to_owned(),
            len  : alleles.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_and_reset() {
        let mut counts = RunningAlleleCounts::new();
        counts.record(3);
        counts.record(3);
        counts.record(7);
        assert_eq!(counts.seen(3), 2);
        assert_eq!(counts.seen(7), 1);
        assert_eq!(counts.seen(42), 0);
        assert_eq!(counts.total(), 3);
        counts.reset();
        assert_eq!(counts.seen(3), 0);
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn denominator_matches_the_sampling_formula() {
        let theta = 0.03;
        assert!((theta_denominator(0, theta) - (1.0 - theta)).abs() < 1e-12);
        assert!((theta_denominator(1, theta) - 1.0).abs() < 1e-12);
        assert!((theta_denominator(2, theta) - (1.0 + theta)).abs() < 1e-12);
        assert!((theta_denominator(3, theta) - (1.0 + 2.0 * theta)).abs() < 1e-12);
    }
}
