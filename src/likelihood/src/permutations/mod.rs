use std::sync::Arc;

use itertools::Itertools;
use parking_lot::Mutex;

use popstats::PopulationStatistics;
use profile::locus::LocusError;
use profile::{registry, Allele, Locus, Sample};

use crate::cancellation::{Cancelled, CancellationToken};

/// One candidate genotype assignment: an ordered genotype per unknown
/// contributor, plus the combinatorial weight compensating for the
/// interchangeability of the indistinguishable unknowns.
#[derive(Debug, Clone, PartialEq)]
pub struct Permutation {
    genotypes: Vec<Locus>,
    factor   : f64,
}

impl Permutation {
    pub fn genotypes(&self) -> &[Locus] {
        &self.genotypes
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

/// Candidate genotype pool for one locus: all unordered allele pairs drawn
/// from the statistics alleles plus any allele observed in an active
/// replicate but rare in (absent from) the statistics.
pub fn candidate_genotypes(
    locus_name: &str,
    statistics: &PopulationStatistics,
    replicates: &[Arc<Sample>],
) -> Result<Vec<Locus>, LocusError> {
    let locus_name = registry::normalize_locus(locus_name);
    let locus_id = registry::intern_locus(&locus_name);

    let mut labels = statistics.alleles(&locus_name);
    for replicate in replicates {
        let Some(locus) = replicate.get_locus(&locus_name) else { continue };
        for allele in locus.alleles() {
            if statistics.is_rare(locus_id, allele.id()) && !labels.iter().any(|label| label == allele.label()) {
                labels.push(allele.label().to_owned());
            }
        }
    }

    labels
        .iter()
        .combinations_with_replacement(2)
        .map(|pair| Ok(Locus::pair(&locus_name, Allele::new(pair[0])?, Allele::new(pair[1])?)?))
        .collect()
}

#[derive(Debug)]
struct CursorState {
    first: usize,
    rest : Vec<usize>,
}

/// Shared enumerator over the genotype assignments of all unknown
/// contributors at one locus.
///
/// The first unknown (the possibly related one) walks the pool directly;
/// the remaining slots walk non-decreasing index vectors, i.e. multisets,
/// each weighted by its number of orderings. Multiple worker jobs pull from
/// one cursor concurrently behind a lock: exhaustion is a plain `None`, and
/// concurrent consumers racing past the end simply observe `None` as well.
/// Every step checks the cancellation token.
#[derive(Debug)]
pub struct PermutationCursor {
    pool : Vec<Locus>,
    slots: usize,
    token: CancellationToken,
    state: Mutex<CursorState>,
}

impl PermutationCursor {
    /// `unknowns` is the hypothesis' total unknown-contributor count (≥ 1).
    pub fn new(pool: Vec<Locus>, unknowns: usize, token: CancellationToken) -> Self {
        let slots = unknowns.saturating_sub(1);
        let state = CursorState { first: 0, rest: vec![0; slots] };
        Self { pool, slots, token, state: Mutex::new(state) }
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Exact number of assignments this cursor will yield.
    pub fn total_len(&self) -> usize {
        self.pool.len() * multiset_count(self.pool.len(), self.slots)
    }

    /// Next genotype assignment, `Ok(None)` on exhaustion. Aborts promptly
    /// with [`Cancelled`] once the token is set.
    pub fn next(&self) -> Result<Option<Permutation>, Cancelled> {
        self.token.check()?;

        let mut state = self.state.lock();
        if state.first >= self.pool.len() || self.pool.is_empty() {
            return Ok(None);
        }

        let mut genotypes = Vec::with_capacity(self.slots + 1);
        genotypes.push(self.pool[state.first].clone());
        genotypes.extend(state.rest.iter().map(|index| self.pool[*index].clone()));
        let factor = ordering_count(&state.rest);

        self.advance(&mut state);
        Ok(Some(Permutation { genotypes, factor }))
    }

    /// Advance `rest` through all non-decreasing index vectors; on rollover,
    /// move to the next first-unknown candidate.
    fn advance(&self, state: &mut CursorState) {
        let top = self.pool.len() - 1;
        for position in (0..state.rest.len()).rev() {
            if state.rest[position] < top {
                let next = state.rest[position] + 1;
                for slot in &mut state.rest[position..] {
                    *slot = next;
                }
                return;
            }
        }
        state.first += 1;
        state.rest.iter_mut().for_each(|slot| *slot = 0);
    }
}

/// Number of distinct orderings of a sorted index multiset:
/// `len! / Π multiplicity!`.
fn ordering_count(sorted: &[usize]) -> f64 {
    let mut factor = factorial(sorted.len());
    let mut run = 1;
    for window in sorted.windows(2) {
        if window[0] == window[1] {
            run += 1;
        } else {
            factor /= factorial(run);
            run = 1;
        }
    }
    factor / factorial(run)
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, i| acc * i as f64)
}

/// Number of multisets of size `k` over `n` elements.
fn multiset_count(n: usize, k: usize) -> usize {
    if k == 0 {
        return 1;
    }
    if n == 0 {
        return 0;
    }
    // C(n + k - 1, k)
    let mut count: usize = 1;
    for i in 0..k {
        count = count * (n + i) / (i + 1);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(labels: &[&str]) -> Vec<Locus> {
        labels
            .iter()
            .combinations_with_replacement(2)
            .map(|pair| Locus::pair("VWA", Allele::new(pair[0]).unwrap(), Allele::new(pair[1]).unwrap()).unwrap())
            .collect()
    }

    fn drain(cursor: &PermutationCursor) -> Vec<Permutation> {
        let mut permutations = Vec::new();
        while let Some(permutation) = cursor.next().unwrap() {
            permutations.push(permutation);
        }
        permutations
    }

    #[test]
    fn single_unknown_walks_the_pool_once() {
        let pool = pool(&["14", "15"]); // 3 genotypes
        let cursor = PermutationCursor::new(pool.clone(), 1, CancellationToken::new());
        let permutations = drain(&cursor);
        assert_eq!(permutations.len(), 3);
        assert!(permutations.iter().all(|p| p.genotypes().len() == 1 && (p.factor() - 1.0).abs() < 1e-12));
        // Exhausted cursors keep returning None.
        assert!(cursor.next().unwrap().is_none());
    }

    #[test]
    fn factors_account_for_interchangeable_unknowns() {
        let pool = pool(&["14", "15"]); // 3 genotypes
        let cursor = PermutationCursor::new(pool, 3, CancellationToken::new());
        let permutations = drain(&cursor);
        assert_eq!(permutations.len(), cursor.total_len());
        // Σ factors over multisets of the last two slots = 3², per first
        // candidate: the weighted enumeration covers all ordered tuples.
        let weighted: f64 = permutations.iter().map(Permutation::factor).sum();
        assert!((weighted - 27.0).abs() < 1e-9);
    }

    #[test]
    fn cancellation_is_observed_within_one_step() {
        let token = CancellationToken::new();
        let cursor = PermutationCursor::new(pool(&["14", "15"]), 2, token.clone());
        assert!(cursor.next().unwrap().is_some());
        token.cancel();
        assert_eq!(cursor.next(), Err(Cancelled));
    }

    #[test]
    fn pool_includes_rare_replicate_alleles() {
        let mut statistics = PopulationStatistics::new("test");
        statistics.add_statistic("VWA", "14", 0.2).unwrap();
        statistics.add_statistic("VWA", "15", 0.3).unwrap();

        let mut replicate = Sample::new("rep-1");
        let mut locus = Locus::new("VWA");
        locus.add_allele(Allele::new("14").unwrap()).unwrap();
        locus.add_allele(Allele::new("19").unwrap()).unwrap(); // absent from statistics
        replicate.add_locus(locus);

        let genotypes = candidate_genotypes("VWA", &statistics, &[Arc::new(replicate)]).unwrap();
        // 3 alleles -> 6 unordered pairs.
        assert_eq!(genotypes.len(), 6);
        assert!(genotypes.iter().any(|g| g.contains_id(profile::intern_allele("19"))));
    }
}
