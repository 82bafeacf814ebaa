mod error;
pub mod generator;

pub use error::{ConfigError, JobError};

use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;

use popstats::PopulationStatistics;
use profile::Locus;

use crate::calculators::{
    theta_denominator, unrelated_calculator, GenotypeProbabilityCalculator, RelatedCalculator, RunningAlleleCounts,
};
use crate::cancellation::CancellationToken;
use crate::config::Side;
use crate::hypothesis::Hypothesis;
use crate::permutations::PermutationCursor;

/// Partial probability computed by one job, aggregated by the scheduler
/// into the (hypothesis, locus) accumulator.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub side       : Side,
    pub locus      : String,
    pub probability: f64,
}

/// Computes the probability of observing the replicate data at one locus
/// under one hypothesis, summed over the candidate genotype assignments
/// pulled from the shared enumerator.
///
/// All inputs are shared read-only; classification buffers, allele counts
/// and the per-content replicate cache are private scratch state.
pub struct LocusProbabilityJob {
    side          : Side,
    locus_name    : String,
    locus_id      : u32,
    hypothesis    : Arc<Hypothesis>,
    statistics    : Arc<PopulationStatistics>,
    replicates    : Vec<Locus>,
    cursor        : Option<Arc<PermutationCursor>>,
    token         : CancellationToken,
    related       : Option<RelatedCalculator>,
    unrelated     : Box<dyn GenotypeProbabilityCalculator + Send>,
    known_carriers: IndexMap<u32, Vec<f64>>,
    counts        : RunningAlleleCounts,
    match_cache   : AHashMap<Vec<u32>, f64>,
}

impl LocusProbabilityJob {
    /// Build a job, verifying the hypothesis against the locus. A
    /// contributor (or relatedness reference) whose sample lacks the locus
    /// is a configuration error, raised here and never deferred into the
    /// worker pool.
    pub fn new(
        side      : Side,
        locus_name: &str,
        hypothesis: Arc<Hypothesis>,
        statistics: Arc<PopulationStatistics>,
        replicates: Vec<Locus>,
        cursor    : Option<Arc<PermutationCursor>>,
        token     : CancellationToken,
        validation: bool,
    ) -> Result<Self, ConfigError> {
        let locus_name = profile::normalize_locus(locus_name);
        let locus_id = profile::intern_locus(&locus_name);

        // Fixed across all genotype assignments: the known contributors'
        // homozygote-aware dropout factor per carried allele.
        let mut known_carriers: IndexMap<u32, Vec<f64>> = IndexMap::new();
        for contributor in hypothesis.contributors() {
            let locus = contributor.sample().get_locus(&locus_name).ok_or_else(|| ConfigError::MissingLocus {
                hypothesis: hypothesis.id().to_owned(),
                sample    : contributor.sample().id().to_owned(),
                locus     : locus_name.clone(),
            })?;
            let factor = contributor.dropout_probability(locus.is_homozygote());
            let mut seen: Vec<u32> = Vec::with_capacity(2);
            for allele in locus.alleles() {
                if !seen.contains(&allele.id()) {
                    seen.push(allele.id());
                    known_carriers.entry(allele.id()).or_default().push(factor);
                }
            }
        }

        let related = match hypothesis.relatedness().reference() {
            Some(reference) if hypothesis.unknown_count() > 0 => {
                let locus = reference.get_locus(&locus_name).ok_or_else(|| ConfigError::MissingLocus {
                    hypothesis: hypothesis.id().to_owned(),
                    sample    : reference.id().to_owned(),
                    locus     : locus_name.clone(),
                })?;
                Some(RelatedCalculator::new(
                    Arc::clone(&statistics),
                    hypothesis.relatedness().relation(),
                    locus.clone(),
                    hypothesis.theta(),
                    validation,
                )?)
            }
            _ => None,
        };

        let unrelated = unrelated_calculator(Arc::clone(&statistics), hypothesis.theta(), validation);

        Ok(Self {
            side,
            locus_name,
            locus_id,
            hypothesis,
            statistics,
            replicates,
            cursor,
            token,
            related,
            unrelated,
            known_carriers,
            counts     : RunningAlleleCounts::new(),
            match_cache: AHashMap::new(),
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn locus_name(&self) -> &str {
        &self.locus_name
    }

    /// Run to completion, pulling genotype assignments from the shared
    /// cursor until it is exhausted. Cancellation propagates, it is never
    /// swallowed.
    pub fn run(&mut self) -> Result<JobOutput, JobError> {
        self.token.check()?;
        let probability = match self.cursor.as_ref().map(Arc::clone) {
            None => self.evaluate(&[], 1.0)?,
            Some(cursor) => {
                let mut sum = 0.0;
                while let Some(permutation) = cursor.next()? {
                    sum += self.evaluate(permutation.genotypes(), permutation.factor())?;
                }
                sum
            }
        };
        Ok(JobOutput { side: self.side, locus: self.locus_name.clone(), probability })
    }

    /// Probability contribution of one genotype assignment:
    /// replicate-match × genotype probability × permutation weight.
    fn evaluate(&mut self, genotypes: &[Locus], factor: f64) -> Result<f64, JobError> {
        let genotype_probability = self.genotype_probability(genotypes)?;
        let match_probability = self.replicates_probability(genotypes);
        Ok(match_probability * genotype_probability * factor)
    }

    /// Product of the relation-aware probability of the first unknown's
    /// genotype and the unrelated probabilities of the rest, divided by the
    /// theta-driven denominator accumulated across all unknown allele
    /// draws.
    fn genotype_probability(&mut self, genotypes: &[Locus]) -> Result<f64, JobError> {
        self.counts.reset();
        let theta = self.hypothesis.theta();

        let mut numerator = 1.0;
        let mut denominator = 1.0;
        for (index, genotype) in genotypes.iter().enumerate() {
            match (index, self.related.as_mut()) {
                (0, Some(related)) => {
                    // Kinship models normalize internally.
                    numerator *= related.calculate(&mut self.counts, genotype)?;
                }
                _ => {
                    let prior = self.counts.total();
                    numerator *= self.unrelated.calculate(&mut self.counts, genotype)?;
                    denominator *= theta_denominator(prior, theta) * theta_denominator(prior + 1, theta);
                }
            }
        }
        Ok(numerator / denominator)
    }

    /// Probability that every replicate shows what it shows, given the
    /// known contributors and the current unknown genotypes. Replicate loci
    /// sharing identical allele content are priced once per assignment.
    fn replicates_probability(&mut self, genotypes: &[Locus]) -> f64 {
        self.match_cache.clear();

        // Expected alleles: known carriers plus the current unknowns.
        let mut expected = self.known_carriers.clone();
        let unknown_dropout = self.hypothesis.unknown_dropout();
        for genotype in genotypes {
            let factor = if genotype.is_homozygote() {
                unknown_dropout * unknown_dropout
            } else {
                unknown_dropout
            };
            let mut seen: Vec<u32> = Vec::with_capacity(2);
            for allele in genotype.alleles() {
                if !seen.contains(&allele.id()) {
                    seen.push(allele.id());
                    expected.entry(allele.id()).or_default().push(factor);
                }
            }
        }

        let statistics = &self.statistics;
        let locus_id = self.locus_id;
        let dropin = self.hypothesis.dropin();
        let mut product = 1.0;
        for replicate in &self.replicates {
            let key = replicate.content_key();
            let probability = match self.match_cache.get(&key) {
                Some(cached) => *cached,
                None => {
                    let probability = Self::replicate_probability(replicate, &expected, statistics, locus_id, dropin);
                    self.match_cache.insert(key, probability);
                    probability
                }
            };
            product *= probability;
        }
        product
    }

    /// Classify every allele of one replicate locus and price it:
    /// dropped-out (expected, absent), present (expected, observed), or
    /// dropped-in (observed, unexpected).
    fn replicate_probability(
        replicate : &Locus,
        expected  : &IndexMap<u32, Vec<f64>>,
        statistics: &PopulationStatistics,
        locus_id  : u32,
        dropin    : f64,
    ) -> f64 {
        let mut probability = 1.0;

        for (allele_id, dropout_factors) in expected {
            let all_dropped: f64 = dropout_factors.iter().product();
            if replicate.contains_id(*allele_id) {
                probability *= 1.0 - all_dropped;
            } else {
                probability *= all_dropped;
            }
        }

        let mut dropins = 0usize;
        let mut seen: Vec<u32> = Vec::with_capacity(replicate.len());
        for allele in replicate.alleles() {
            if seen.contains(&allele.id()) {
                continue;
            }
            seen.push(allele.id());
            if !expected.contains_key(&allele.id()) {
                dropins += 1;
                probability *= dropin * statistics.probability(locus_id, allele.id());
            }
        }
        if dropins == 0 {
            probability *= 1.0 - dropin;
        }
        probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile::Allele;
    use crate::cancellation::{Cancelled, CancellationToken};
    use crate::permutations::candidate_genotypes;
    use profile::Sample;

    fn statistics() -> Arc<PopulationStatistics> {
        let mut stats = PopulationStatistics::new("test-pop");
        stats.add_statistic("VWA", "14", 0.25).unwrap();
        stats.add_statistic("VWA", "15", 0.25).unwrap();
        stats.add_statistic("VWA", "16", 0.5).unwrap();
        Arc::new(stats)
    }

    fn locus_with(name: &str, labels: &[&str]) -> Locus {
        let mut locus = Locus::new(name);
        for label in labels {
            locus.add_allele(Allele::new(label).unwrap()).unwrap();
        }
        locus
    }

    fn sample_with(id: &str, name: &str, labels: &[&str]) -> Arc<Sample> {
        let mut sample = Sample::new(id);
        sample.add_locus(locus_with(name, labels));
        Arc::new(sample)
    }

    fn hypothesis_with_known(dropout: f64, dropin: f64) -> Arc<Hypothesis> {
        let mut hypothesis = Hypothesis::new("prosecution", dropin, 0.0).unwrap();
        hypothesis.add_contributor(sample_with("suspect", "VWA", &["14", "15"]), dropout).unwrap();
        Arc::new(hypothesis)
    }

    #[test]
    fn matching_known_contributor_prices_only_presence() {
        // Two replicates matching the suspect exactly, no dropout, no
        // drop-in: every presence price is 1 - 0 and the empty drop-in
        // class contributes 1 - 0, so the locus probability is exactly 1.
        let hypothesis = hypothesis_with_known(0.0, 0.0);
        let replicates = vec![locus_with("VWA", &["14", "15"]), locus_with("VWA", &["14", "15"])];
        let mut job = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", hypothesis, statistics(), replicates, None, CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        assert!((output.probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn presence_price_uses_one_minus_dropout() {
        let d = 0.1;
        let hypothesis = hypothesis_with_known(d, 0.0);
        let replicates = vec![locus_with("VWA", &["14", "15"])];
        let mut job = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", hypothesis, statistics(), replicates, None, CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        // Both heterozygous alleles present: (1-d)² and no drop-in: ×1.
        assert!((output.probability - (1.0 - d) * (1.0 - d)).abs() < 1e-12);
    }

    #[test]
    fn absent_expected_allele_is_priced_as_dropout() {
        let d = 0.2;
        let hypothesis = hypothesis_with_known(d, 0.0);
        let replicates = vec![locus_with("VWA", &["14"])];
        let mut job = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", hypothesis, statistics(), replicates, None, CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        // 14 present (1-d), 15 dropped out (d), no drop-in (1-0).
        assert!((output.probability - (1.0 - d) * d).abs() < 1e-12);
    }

    #[test]
    fn unexpected_allele_is_priced_as_dropin() {
        let c = 0.05;
        let hypothesis = hypothesis_with_known(0.0, c);
        let replicates = vec![locus_with("VWA", &["14", "15", "16"])];
        let mut job = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", hypothesis, statistics(), replicates, None, CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        // 16 dropped in: c × p(16); both suspect alleles present with d=0.
        assert!((output.probability - c * 0.5).abs() < 1e-12);
    }

    #[test]
    fn homozygote_knowns_use_squared_dropout() {
        let d = 0.3;
        let mut hypothesis = Hypothesis::new("prosecution", 0.0, 0.0).unwrap();
        hypothesis.add_contributor(sample_with("suspect", "VWA", &["14", "14"]), d).unwrap();
        let replicates = vec![locus_with("VWA", &[] as &[&str])];
        let mut job = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", Arc::new(hypothesis), statistics(), replicates, None, CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        // The lone expected allele dropped out of an empty replicate: d².
        assert!((output.probability - d * d).abs() < 1e-12);
    }

    #[test]
    fn missing_contributor_locus_fails_at_construction() {
        let mut hypothesis = Hypothesis::new("prosecution", 0.0, 0.0).unwrap();
        hypothesis.add_contributor(sample_with("suspect", "FGA", &["20", "21"]), 0.1).unwrap();
        let result = LocusProbabilityJob::new(
            Side::Prosecution, "VWA", Arc::new(hypothesis), statistics(),
            vec![locus_with("VWA", &["14"])], None, CancellationToken::new(), false,
        );
        assert!(matches!(result, Err(ConfigError::MissingLocus { .. })));
    }

    #[test]
    fn unknown_enumeration_sums_over_the_pool() {
        // One unknown, no knowns: Σ over genotypes of
        // P(replicate | genotype) × HW(genotype) with d = 0 and c = 0.
        // Only the genotype 14/15 leaves neither dropout nor drop-in, so
        // the total is its HW probability: 2 × 0.25 × 0.25.
        let mut hypothesis = Hypothesis::new("defense", 0.0, 0.0).unwrap();
        hypothesis.set_unknown_count(1);
        let hypothesis = Arc::new(hypothesis);

        let statistics = statistics();
        let replicate_sample = sample_with("rep", "VWA", &["14", "15"]);
        let pool = candidate_genotypes("VWA", &statistics, &[Arc::clone(&replicate_sample)]).unwrap();
        let cursor = Arc::new(PermutationCursor::new(pool, 1, CancellationToken::new()));

        let mut job = LocusProbabilityJob::new(
            Side::Defense, "VWA", hypothesis, statistics,
            vec![locus_with("VWA", &["14", "15"])], Some(cursor), CancellationToken::new(), false,
        ).unwrap();
        let output = job.run().unwrap();
        assert!((output.probability - 2.0 * 0.25 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn cancellation_propagates_out_of_run() {
        let mut hypothesis = Hypothesis::new("defense", 0.0, 0.0).unwrap();
        hypothesis.set_unknown_count(2);
        let statistics = statistics();
        let pool = candidate_genotypes("VWA", &statistics, &[]).unwrap();
        let token = CancellationToken::new();
        let cursor = Arc::new(PermutationCursor::new(pool, 2, token.clone()));

        let mut job = LocusProbabilityJob::new(
            Side::Defense, "VWA", Arc::new(hypothesis), statistics,
            vec![locus_with("VWA", &["14"])], Some(cursor), CancellationToken::new(), false,
        ).unwrap();
        token.cancel();
        assert!(matches!(job.run(), Err(JobError::Cancelled(Cancelled))));
    }
}
