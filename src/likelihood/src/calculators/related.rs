use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use popstats::PopulationStatistics;
use profile::{Allele, Locus};

use super::{genotype_alleles, CalculatorError, GenotypeProbabilityCalculator, RunningAlleleCounts};
use crate::hypothesis::Relation;

/// Genotype probability for an unknown declared related to a known
/// reference individual.
///
/// The model is an identity-by-descent mixture: the relation fixes a
/// distribution over 0/1/2 alleles shared IBD, and each IBD state has a
/// closed-form probability conditioned on the reference genotype. The
/// coancestry-corrected conditional draws condition on the reference's two
/// alleles: the first extra draw is normalized by `(1+θ)`, the second by
/// `(1+2θ)`.
///
/// One instance lives per job. Results are cached by (reference content,
/// candidate content); the cache is disabled in validation mode, which logs
/// the branch and terms instead for audit trails.
pub struct RelatedCalculator {
    statistics: Arc<PopulationStatistics>,
    relation  : Relation,
    reference : Locus,
    theta     : f64,
    validation: bool,
    cache     : AHashMap<(Vec<u32>, Vec<u32>), f64>,
}

impl RelatedCalculator {
    pub fn new(
        statistics: Arc<PopulationStatistics>,
        relation  : Relation,
        reference : Locus,
        theta     : f64,
        validation: bool,
    ) -> Result<Self, CalculatorError> {
        let mut reference = reference;
        if reference.len() == 1 {
            // A lone observed allele models a homozygote.
            reference.treat_as_homozygote().map_err(|_| CalculatorError::MalformedReference {
                locus: reference.name().to_owned(),
                len  : reference.len(),
            })?;
        }
        if reference.len() != 2 {
            return Err(CalculatorError::MalformedReference {
                locus: reference.name().to_owned(),
                len  : reference.len(),
            });
        }
        Ok(Self { statistics, relation, reference, theta, validation, cache: AHashMap::new() })
    }

    fn population(&self, allele: &Allele) -> f64 {
        self.statistics.probability(self.reference.id(), allele.id())
    }

    /// Copies of `allele` among the reference's two alleles.
    fn reference_copies(&self, allele: &Allele) -> u32 {
        self.reference.alleles().iter().filter(|r| *r == allele).count() as u32
    }

    /// First conditional draw given the reference genotype:
    /// `(m·θ + (1−θ)·p) / (1+θ)` with `m` = copies among the reference.
    fn draw_first(&self, allele: &Allele) -> f64 {
        let m = f64::from(self.reference_copies(allele));
        (m * self.theta + (1.0 - self.theta) * self.population(allele)) / (1.0 + self.theta)
    }

    /// Second conditional draw, after `extra` further copies of `allele`
    /// have been drawn: `((m+extra)·θ + (1−θ)·p) / (1+2θ)`.
    fn draw_second(&self, allele: &Allele, extra: u32) -> f64 {
        let m = f64::from(self.reference_copies(allele) + extra);
        (m * self.theta + (1.0 - self.theta) * self.population(allele)) / (1.0 + 2.0 * self.theta)
    }

    /// Zero-IBD term: both subject alleles drawn from the population,
    /// conditioned on the reference genotype.
    fn unshared_term(&self, first: &Allele, second: &Allele) -> f64 {
        if first == second {
            self.draw_first(first) * self.draw_second(second, 1)
        } else {
            2.0 * self.draw_first(first) * self.draw_second(second, 0)
        }
    }

    /// One-IBD term: one subject allele is a copy of a reference allele
    /// (either of the two, for a heterozygous reference), the other is
    /// drawn conditioned on the reference genotype.
    fn shared_one_term(&self, first: &Allele, second: &Allele) -> f64 {
        let (ref_first, ref_second) = (&self.reference.alleles()[0], &self.reference.alleles()[1]);
        if self.reference.is_homozygote() {
            // The transmitted allele can only be ref_first.
            match other_subject_allele(ref_first, first, second) {
                Some(other) => self.draw_first(other),
                None => 0.0,
            }
        } else {
            let mut term = 0.0;
            for transmitted in [ref_first, ref_second] {
                if let Some(other) = other_subject_allele(transmitted, first, second) {
                    term += 0.5 * self.draw_first(other);
                }
            }
            term
        }
    }

    /// Two-IBD term: the subject carries the reference genotype itself.
    fn shared_two_term(&self, candidate: &Locus) -> f64 {
        if candidate.content_key() == self.reference.content_key() { 1.0 } else { 0.0 }
    }
}

/// If the subject genotype `{first, second}` contains `transmitted`, return
/// the allele paired with it; otherwise the IBD-1 configuration is
/// impossible for this candidate.
fn other_subject_allele<'a>(transmitted: &Allele, first: &'a Allele, second: &'a Allele) -> Option<&'a Allele> {
    if first == transmitted {
        Some(second)
    } else if second == transmitted {
        Some(first)
    } else {
        None
    }
}

impl GenotypeProbabilityCalculator for RelatedCalculator {
    fn calculate(&mut self, counts: &mut RunningAlleleCounts, candidate: &Locus) -> Result<f64, CalculatorError> {
        let (first, second) = genotype_alleles(candidate)?;

        // Later unknowns are enriched by this subject's alleles whether or
        // not the result itself comes from the cache.
        counts.record(first.id());
        counts.record(second.id());

        let key = (self.reference.content_key(), candidate.content_key());
        if !self.validation {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(*cached);
            }
        }

        let [k0, k1, k2] = self.relation.ibd_distribution();
        let p0 = if k0 > 0.0 { self.unshared_term(first, second) } else { 0.0 };
        let p1 = if k1 > 0.0 { self.shared_one_term(first, second) } else { 0.0 };
        let p2 = if k2 > 0.0 { self.shared_two_term(candidate) } else { 0.0 };
        let probability = k0 * p0 + k1 * p1 + k2 * p2;

        if self.validation {
            debug!(
                target: "validation",
                "related[{}] ref={} subject={candidate} k=[{k0},{k1},{k2}] ibd0={p0} ibd1={p1} ibd2={p2} => {probability}",
                self.relation, self.reference,
            );
        } else {
            self.cache.insert(key, probability);
        }
        Ok(probability)
    }
}
