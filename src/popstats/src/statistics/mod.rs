mod error;
pub use error::PopStatsError;

use ahash::AHashSet;
use indexmap::{IndexMap, IndexSet};
use log::trace;

use profile::registry;

/// Fallback frequency assigned to alleles absent from the statistics source.
pub const DEFAULT_RARE_FREQUENCY: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
struct Statistic {
    frequency: f64,
    rare     : bool,
}

/// Per-locus, per-allele population frequency table.
///
/// Storage is dense: rows are indexed by interned locus id, columns by
/// interned allele id, so lookups inside the enumeration hot loop are two
/// array indexings. Alleles never recorded for a locus fall back to the
/// configured rare-allele frequency.
#[derive(Debug, Clone)]
pub struct PopulationStatistics {
    id            : String,
    rare_frequency: f64,
    table         : Vec<Vec<Option<Statistic>>>,
    observed      : IndexMap<String, IndexSet<String>>,
    compound      : AHashSet<String>,
}

impl PopulationStatistics {
    pub fn new(id: &str) -> Self {
        Self {
            id            : id.to_owned(),
            rare_frequency: DEFAULT_RARE_FREQUENCY,
            table         : Vec::new(),
            observed      : IndexMap::new(),
            compound      : AHashSet::new(),
        }
    }

    /// Identity of the statistics source (name + content hash), folded into
    /// hypothesis GUIDs so equivalent hypotheses over different population
    /// tables are never conflated.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rare_frequency(&self) -> f64 {
        self.rare_frequency
    }

    pub fn set_rare_frequency(&mut self, frequency: f64) -> Result<(), PopStatsError> {
        Self::check_frequency(frequency)?;
        self.rare_frequency = frequency;
        Ok(())
    }

    fn check_frequency(frequency: f64) -> Result<(), PopStatsError> {
        if !(0.0..=1.0).contains(&frequency) || frequency.is_nan() {
            return Err(PopStatsError::InvalidFrequency(frequency));
        }
        Ok(())
    }

    /// Record the frequency of `allele` at `locus`.
    pub fn add_statistic(&mut self, locus: &str, allele: &str, frequency: f64) -> Result<(), PopStatsError> {
        Self::check_frequency(frequency)?;
        let locus_name  = registry::normalize_locus(locus);
        let allele_name = registry::normalize_allele(allele);
        let locus_id  = registry::intern_locus(&locus_name) as usize;
        let allele_id = registry::intern_allele(&allele_name) as usize;

        if self.table.len() <= locus_id {
            self.table.resize_with(locus_id + 1, Vec::new);
        }
        let row = &mut self.table[locus_id];
        if row.len() <= allele_id {
            row.resize(allele_id + 1, None);
        }
        row[allele_id] = Some(Statistic { frequency, rare: false });
        self.observed.entry(locus_name).or_default().insert(allele_name);
        Ok(())
    }

    /// Mark an allele designation as compound. Compound alleles keep their
    /// recorded frequency but are excluded from candidate-genotype pools.
    pub fn add_compound(&mut self, allele: &str) {
        self.compound.insert(registry::normalize_allele(allele));
    }

    /// Stored frequency, or the rare-allele fallback when the allele was
    /// never recorded for this locus.
    pub fn probability(&self, locus_id: u32, allele_id: u32) -> f64 {
        match self.lookup(locus_id, allele_id) {
            Some(statistic) => statistic.frequency,
            None => {
                trace!("no frequency recorded for locus #{locus_id} allele #{allele_id}: falling back to {}", self.rare_frequency);
                self.rare_frequency
            }
        }
    }

    /// Whether the allele is rare at this locus: either flagged as such, or
    /// absent from the statistics source altogether.
    pub fn is_rare(&self, locus_id: u32, allele_id: u32) -> bool {
        match self.lookup(locus_id, allele_id) {
            Some(statistic) => statistic.rare,
            None => true,
        }
    }

    fn lookup(&self, locus_id: u32, allele_id: u32) -> Option<Statistic> {
        *self.table.get(locus_id as usize)?.get(allele_id as usize)?
    }

    /// All recorded, non-compound allele designations for a locus, in
    /// recording order. This is the base of the candidate-genotype pool.
    pub fn alleles(&self, locus_name: &str) -> Vec<String> {
        let locus_name = registry::normalize_locus(locus_name);
        match self.observed.get(&locus_name) {
            Some(alleles) => alleles.iter()
                .filter(|allele| !self.compound.contains(allele.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether the locus was observed at all in the statistics source.
    pub fn is_present(&self, locus_name: &str) -> bool {
        self.observed.contains_key(&registry::normalize_locus(locus_name))
    }

    /// Names of all loci known to the statistics source, in recording order.
    pub fn loci(&self) -> impl Iterator<Item = &str> {
        self.observed.keys().map(String::as_str)
    }
}
