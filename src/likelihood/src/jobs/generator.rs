use std::sync::Arc;

use log::{debug, warn};

use profile::Locus;

use super::{ConfigError, LocusProbabilityJob};
use crate::cancellation::CancellationToken;
use crate::config::{AnalysisConfig, Side};
use crate::permutations::{candidate_genotypes, PermutationCursor};

/// Work planned for one (hypothesis, locus) pair.
#[derive(Debug, Clone)]
pub struct PairInfo {
    pub side          : Side,
    pub locus         : String,
    pub job_count     : usize,
    /// Number of genotype assignments the pair will enumerate.
    pub estimated_size: usize,
}

/// Every job of one analysis, plus the per-pair bookkeeping the aggregator
/// needs.
pub struct JobBatch {
    pub jobs : Vec<LocusProbabilityJob>,
    pub pairs: Vec<PairInfo>,
}

/// Build all jobs for both hypothesis sides across all enabled loci.
///
/// With no unknown contributors a pair gets a single job without an
/// enumerator. Otherwise the candidate pool is built once and one job per
/// first-unknown candidate genotype is emitted, all draining one shared
/// cursor. Configuration errors surface here, before anything is scheduled.
pub fn generate(config: &AnalysisConfig, token: &CancellationToken) -> Result<JobBatch, ConfigError> {
    if config.hypothesis(Side::Prosecution).is_none() && config.hypothesis(Side::Defense).is_none() {
        return Err(ConfigError::NoHypotheses);
    }
    let replicates = config.active_replicates();
    if replicates.is_empty() {
        return Err(ConfigError::NoReplicates);
    }
    let loci = config.effective_loci();
    if loci.is_empty() {
        return Err(ConfigError::NoLoci);
    }

    let statistics = config.statistics();
    let mut jobs  = Vec::new();
    let mut pairs = Vec::new();

    for locus_name in &loci {
        if !statistics.is_present(locus_name) {
            warn!("locus '{locus_name}' is absent from the population statistics: invalidated");
            continue;
        }
        // Only replicates that typed this locus take part in it.
        let replicate_loci: Vec<Locus> = replicates
            .iter()
            .filter_map(|sample| sample.get_locus(locus_name).cloned())
            .collect();
        if replicate_loci.is_empty() {
            warn!("locus '{locus_name}' was typed in no active replicate: skipped");
            continue;
        }

        for side in [Side::Prosecution, Side::Defense] {
            let Some(hypothesis) = config.hypothesis(side) else { continue };

            if hypothesis.unknown_count() == 0 {
                jobs.push(LocusProbabilityJob::new(
                    side,
                    locus_name,
                    Arc::clone(hypothesis),
                    Arc::clone(statistics),
                    replicate_loci.clone(),
                    None,
                    token.clone(),
                    config.validation(),
                )?);
                pairs.push(PairInfo { side, locus: locus_name.clone(), job_count: 1, estimated_size: 1 });
                continue;
            }

            let pool = candidate_genotypes(locus_name, statistics, &replicates)?;
            let cursor = Arc::new(PermutationCursor::new(pool, hypothesis.unknown_count(), token.clone()));
            let job_count = cursor.pool_len().max(1);
            let estimated_size = cursor.total_len();
            debug!(
                "{side}/{locus_name}: {job_count} jobs over {estimated_size} genotype assignments ({} unknowns)",
                hypothesis.unknown_count(),
            );
            for _ in 0..job_count {
                jobs.push(LocusProbabilityJob::new(
                    side,
                    locus_name,
                    Arc::clone(hypothesis),
                    Arc::clone(statistics),
                    replicate_loci.clone(),
                    Some(Arc::clone(&cursor)),
                    token.clone(),
                    config.validation(),
                )?);
            }
            pairs.push(PairInfo { side, locus: locus_name.clone(), job_count, estimated_size });
        }
    }

    Ok(JobBatch { jobs, pairs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::Hypothesis;
    use popstats::PopulationStatistics;
    use profile::{Allele, Sample};

    fn statistics() -> Arc<PopulationStatistics> {
        let mut stats = PopulationStatistics::new("pop");
        stats.add_statistic("VWA", "14", 0.5).unwrap();
        stats.add_statistic("VWA", "15", 0.5).unwrap();
        stats.add_statistic("FGA", "20", 1.0).unwrap();
        Arc::new(stats)
    }

    fn replicate() -> Arc<Sample> {
        let mut sample = Sample::new("rep-1");
        for (name, labels) in [("VWA", vec!["14", "15"]), ("FGA", vec!["20"])] {
            let mut locus = Locus::new(name);
            for label in labels {
                locus.add_allele(Allele::new(label).unwrap()).unwrap();
            }
            sample.add_locus(locus);
        }
        Arc::new(sample)
    }

    fn config(unknowns: usize) -> AnalysisConfig {
        let mut config = AnalysisConfig::new(statistics());
        config.add_replicate(replicate());
        let mut hypothesis = Hypothesis::new("defense", 0.0, 0.0).unwrap();
        hypothesis.set_unknown_count(unknowns);
        config.set_defense(hypothesis);
        config
    }

    #[test]
    fn zero_unknowns_yield_one_job_per_pair() {
        let batch = generate(&config(0), &CancellationToken::new()).unwrap();
        assert_eq!(batch.jobs.len(), 2); // VWA + FGA, defense only
        assert_eq!(batch.pairs.len(), 2);
        assert!(batch.pairs.iter().all(|pair| pair.job_count == 1));
    }

    #[test]
    fn unknown_enumeration_splits_into_pool_sized_jobs() {
        let batch = generate(&config(2), &CancellationToken::new()).unwrap();
        // VWA pool: alleles {14, 15} -> 3 genotypes -> 3 jobs; FGA pool:
        // allele {20} -> 1 genotype -> 1 job.
        assert_eq!(batch.jobs.len(), 4);
        let vwa = batch.pairs.iter().find(|pair| pair.locus == "VWA").unwrap();
        assert_eq!(vwa.job_count, 3);
        assert_eq!(vwa.estimated_size, 9); // 3 first candidates × 3 multisets
    }

    #[test]
    fn missing_hypotheses_are_a_configuration_error() {
        let mut config = AnalysisConfig::new(statistics());
        config.add_replicate(replicate());
        assert!(matches!(generate(&config, &CancellationToken::new()), Err(ConfigError::NoHypotheses)));
    }

    #[test]
    fn loci_absent_from_statistics_are_invalidated() {
        let mut config = config(0);
        config.set_enabled_loci(["VWA", "SE33"]);
        let batch = generate(&config, &CancellationToken::new()).unwrap();
        assert_eq!(batch.pairs.len(), 1);
        assert_eq!(batch.pairs[0].locus, "VWA");
    }
}
