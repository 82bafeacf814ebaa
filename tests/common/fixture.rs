use std::sync::Arc;

use likelihood::{AnalysisConfig, Hypothesis};
use popstats::PopulationStatistics;
use profile::{Allele, Locus, Sample};

/// Build a sample from `(marker, alleles)` pairs.
pub fn mock_sample(id: &str, loci: &[(&str, &[&str])]) -> Arc<Sample> {
    let mut sample = Sample::new(id);
    for (name, labels) in loci {
        let mut locus = Locus::new(name);
        for label in *labels {
            locus.add_allele(Allele::new(label).expect("valid allele label")).expect("insertable allele");
        }
        sample.add_locus(locus);
    }
    Arc::new(sample)
}

/// Build a frequency table from `(marker, [(allele, frequency)])` entries.
pub fn mock_statistics(entries: &[(&str, &[(&str, f64)])]) -> Arc<PopulationStatistics> {
    let mut statistics = PopulationStatistics::new("mock-pop");
    for (locus, alleles) in entries {
        for (label, frequency) in *alleles {
            statistics.add_statistic(locus, label, *frequency).expect("valid frequency");
        }
    }
    Arc::new(statistics)
}

/// A two-marker statistics table shared by most scenarios.
pub fn default_statistics() -> Arc<PopulationStatistics> {
    mock_statistics(&[
        ("VWA", &[("14", 0.25), ("15", 0.25), ("16", 0.5)]),
        ("FGA", &[("20", 0.4), ("21", 0.6)]),
    ])
}

pub struct ConfigBuilder {
    config: AnalysisConfig,
}

impl ConfigBuilder {
    pub fn new(statistics: Arc<PopulationStatistics>) -> Self {
        Self { config: AnalysisConfig::new(statistics) }
    }

    pub fn replicate(mut self, replicate: Arc<Sample>) -> Self {
        self.config.add_replicate(replicate);
        self
    }

    pub fn prosecution(mut self, hypothesis: Hypothesis) -> Self {
        self.config.set_prosecution(hypothesis);
        self
    }

    pub fn defense(mut self, hypothesis: Hypothesis) -> Self {
        self.config.set_defense(hypothesis);
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.set_thread_count(threads);
        self
    }

    pub fn build(self) -> AnalysisConfig {
        self.config
    }
}
