use std::sync::Arc;

use log::debug;

use popstats::PopulationStatistics;
use profile::Locus;

use super::{genotype_alleles, CalculatorError, GenotypeProbabilityCalculator, RunningAlleleCounts};

/// Hardy-Weinberg genotype probability: `2·p(a)·p(b)` for heterozygotes,
/// `p(a)²` for homozygotes. Used whenever theta is zero.
pub struct HardyWeinbergCalculator {
    statistics: Arc<PopulationStatistics>,
    validation: bool,
}

impl HardyWeinbergCalculator {
    pub fn new(statistics: Arc<PopulationStatistics>, validation: bool) -> Self {
        Self { statistics, validation }
    }
}

impl GenotypeProbabilityCalculator for HardyWeinbergCalculator {
    fn calculate(&mut self, counts: &mut RunningAlleleCounts, candidate: &Locus) -> Result<f64, CalculatorError> {
        let (first, second) = genotype_alleles(candidate)?;
        let p_first  = self.statistics.probability(candidate.id(), first.id());
        let p_second = self.statistics.probability(candidate.id(), second.id());

        let probability = if first == second {
            p_first * p_second
        } else {
            2.0 * p_first * p_second
        };

        counts.record(first.id());
        counts.record(second.id());

        if self.validation {
            let zygosity = if first == second { "hom" } else { "het" };
            debug!(
                target: "validation",
                "HW {candidate} [{zygosity}]: {}p({first})*p({second}) = {}*{p_first}*{p_second} = {probability}",
                if first == second { "" } else { "2*" },
                if first == second { 1 } else { 2 },
            );
        }
        Ok(probability)
    }
}

/// Coancestry-corrected unrelated genotype probability.
///
/// Each allele's frequency term becomes `count·θ + (1−θ)·p`, where `count`
/// is the number of copies already drawn across earlier unknowns, and is
/// incremented after use (a Pólya-urn-style correction). The matching
/// per-draw denominators are accumulated by the job, not here.
pub struct ThetaCorrectedCalculator {
    statistics: Arc<PopulationStatistics>,
    theta     : f64,
    validation: bool,
}

impl ThetaCorrectedCalculator {
    pub fn new(statistics: Arc<PopulationStatistics>, theta: f64, validation: bool) -> Self {
        Self { statistics, theta, validation }
    }
}

impl GenotypeProbabilityCalculator for ThetaCorrectedCalculator {
    fn calculate(&mut self, counts: &mut RunningAlleleCounts, candidate: &Locus) -> Result<f64, CalculatorError> {
        let (first, second) = genotype_alleles(candidate)?;
        let heterozygous = first != second;

        let mut probability = if heterozygous { 2.0 } else { 1.0 };
        for allele in [first, second] {
            let population = self.statistics.probability(candidate.id(), allele.id());
            let term = f64::from(counts.seen(allele.id())) * self.theta + (1.0 - self.theta) * population;
            probability *= term;
            counts.record(allele.id());
        }

        if self.validation {
            debug!(
                target: "validation",
                "theta-corrected {candidate}: {}prod[n(x)*{} + {}*p(x)] = {probability} (numerator)",
                if heterozygous { "2*" } else { "" },
                self.theta,
                1.0 - self.theta,
            );
        }
        Ok(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile::Allele;

    fn statistics() -> Arc<PopulationStatistics> {
        let mut stats = PopulationStatistics::new("test");
        stats.add_statistic("TH01", "6", 0.2).unwrap();
        stats.add_statistic("TH01", "7", 0.3).unwrap();
        Arc::new(stats)
    }

    fn genotype(a: &str, b: &str) -> Locus {
        Locus::pair("TH01", Allele::new(a).unwrap(), Allele::new(b).unwrap()).unwrap()
    }

    #[test]
    fn hardy_weinberg_heterozygote() {
        let mut calculator = HardyWeinbergCalculator::new(statistics(), false);
        let mut counts = RunningAlleleCounts::new();
        let p = calculator.calculate(&mut counts, &genotype("6", "7")).unwrap();
        assert!((p - 2.0 * 0.2 * 0.3).abs() < 1e-9);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn hardy_weinberg_homozygote() {
        let mut calculator = HardyWeinbergCalculator::new(statistics(), false);
        let mut counts = RunningAlleleCounts::new();
        let p = calculator.calculate(&mut counts, &genotype("6", "6")).unwrap();
        assert!((p - 0.2 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn theta_numerator_uses_prior_draws() {
        let theta = 0.02;
        let mut calculator = ThetaCorrectedCalculator::new(statistics(), theta, false);
        let mut counts = RunningAlleleCounts::new();

        // First unknown 6/6: terms (0θ + (1-θ)p6) and (1θ + (1-θ)p6).
        let first = calculator.calculate(&mut counts, &genotype("6", "6")).unwrap();
        let p6 = 0.2;
        let expected = ((1.0 - theta) * p6) * (theta + (1.0 - theta) * p6);
        assert!((first - expected).abs() < 1e-12);

        // Second unknown 6/7 sees two prior copies of allele 6.
        let second = calculator.calculate(&mut counts, &genotype("6", "7")).unwrap();
        let p7 = 0.3;
        let expected = 2.0 * (2.0 * theta + (1.0 - theta) * p6) * ((1.0 - theta) * p7);
        assert!((second - expected).abs() < 1e-12);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn malformed_genotypes_are_rejected() {
        let mut calculator = HardyWeinbergCalculator::new(statistics(), false);
        let mut counts = RunningAlleleCounts::new();
        let mut single = Locus::new("TH01");
        single.add_allele(Allele::new("6").unwrap()).unwrap();
        assert!(calculator.calculate(&mut counts, &single).is_err());
    }
}
