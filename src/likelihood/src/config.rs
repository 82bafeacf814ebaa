use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use popstats::PopulationStatistics;
use profile::{registry, Sample};

use crate::hypothesis::Hypothesis;

/// Which side of the case a hypothesis argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Prosecution,
    Defense,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prosecution => "prosecution".fmt(f),
            Self::Defense     => "defense".fmt(f),
        }
    }
}

/// Immutable description of one analysis run: both hypotheses (either side
/// may be skipped), the active replicates, the loci to evaluate, the
/// population statistics, and the worker-pool size.
///
/// Shared read-only by every concurrent job.
#[derive(Debug)]
pub struct AnalysisConfig {
    prosecution : Option<Arc<Hypothesis>>,
    defense     : Option<Arc<Hypothesis>>,
    replicates  : Vec<Arc<Sample>>,
    enabled_loci: Vec<String>,
    statistics  : Arc<PopulationStatistics>,
    thread_count: usize,
    validation  : bool,
}

impl AnalysisConfig {
    pub fn new(statistics: Arc<PopulationStatistics>) -> Self {
        Self {
            prosecution : None,
            defense     : None,
            replicates  : Vec::new(),
            enabled_loci: Vec::new(),
            statistics,
            thread_count: 1,
            validation  : false,
        }
    }

    pub fn set_prosecution(&mut self, hypothesis: Hypothesis) {
        self.prosecution = Some(Arc::new(hypothesis));
    }

    pub fn set_defense(&mut self, hypothesis: Hypothesis) {
        self.defense = Some(Arc::new(hypothesis));
    }

    pub fn add_replicate(&mut self, replicate: Arc<Sample>) {
        self.replicates.push(replicate);
    }

    /// Restrict the analysis to the given loci. When never called, every
    /// locus typed in the first active replicate is evaluated.
    pub fn set_enabled_loci<I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, loci: I) {
        self.enabled_loci = loci.into_iter().map(|name| registry::normalize_locus(name.as_ref())).collect();
    }

    pub fn set_thread_count(&mut self, thread_count: usize) {
        self.thread_count = thread_count;
    }

    pub fn set_validation(&mut self, validation: bool) {
        self.validation = validation;
    }

    pub fn hypothesis(&self, side: Side) -> Option<&Arc<Hypothesis>> {
        match side {
            Side::Prosecution => self.prosecution.as_ref(),
            Side::Defense     => self.defense.as_ref(),
        }
    }

    pub fn replicates(&self) -> &[Arc<Sample>] {
        &self.replicates
    }

    /// Replicates taking part in the analysis: the enabled ones.
    pub fn active_replicates(&self) -> Vec<Arc<Sample>> {
        self.replicates.iter().filter(|sample| sample.is_enabled()).cloned().collect()
    }

    /// The loci this analysis evaluates, in a stable order.
    pub fn effective_loci(&self) -> Vec<String> {
        if !self.enabled_loci.is_empty() {
            return self.enabled_loci.clone();
        }
        match self.replicates.iter().find(|sample| sample.is_enabled()) {
            Some(first) => first.locus_names().map(str::to_owned).collect(),
            None => Vec::new(),
        }
    }

    pub fn statistics(&self) -> &Arc<PopulationStatistics> {
        &self.statistics
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn validation(&self) -> bool {
        self.validation
    }
}
