mod error;
pub use error::LocusError;

use std::fmt::{self, Display, Formatter};

use crate::allele::Allele;
use crate::registry;

/// A genetic marker position and the alleles observed there.
///
/// A locus usually carries one or two alleles. The `homozygote` flag is set
/// automatically when a second equal allele is inserted. The separate
/// `treated_as_homozygote` flag distinguishes "only one allele was observed,
/// and it was duplicated for modeling" from "this mixture locus legitimately
/// shows a single distinct allele".
#[derive(Debug, Clone)]
pub struct Locus {
    name                 : String,
    id                   : u32,
    alleles              : Vec<Allele>,
    homozygote           : bool,
    treated_as_homozygote: bool,
}

impl Locus {
    pub fn new(name: &str) -> Self {
        let name = registry::normalize_locus(name);
        let id = registry::intern_locus(&name);
        Self { name, id, alleles: Vec::with_capacity(2), homozygote: false, treated_as_homozygote: false }
    }

    /// Convenience constructor for a two-allele genotype, as produced by the
    /// candidate-genotype enumerator.
    pub fn pair(name: &str, first: Allele, second: Allele) -> Result<Self, LocusError> {
        let mut locus = Self::new(name);
        locus.add_allele(first)?;
        locus.add_allele(second)?;
        Ok(locus)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dense interned id of the locus name.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn is_homozygote(&self) -> bool {
        self.homozygote
    }

    pub fn is_treated_as_homozygote(&self) -> bool {
        self.treated_as_homozygote
    }

    pub fn contains(&self, allele: &Allele) -> bool {
        self.alleles.contains(allele)
    }

    pub fn contains_id(&self, allele_id: u32) -> bool {
        self.alleles.iter().any(|a| a.id() == allele_id)
    }

    /// Insert an allele, parenting it to this locus. Inserting an allele
    /// equal to one already present raises the homozygote flag.
    pub fn add_allele(&mut self, mut allele: Allele) -> Result<(), LocusError> {
        allele.set_locus(&self.name)?;
        if self.alleles.contains(&allele) {
            self.homozygote = true;
        }
        self.alleles.push(allele);
        Ok(())
    }

    /// Duplicate a lone observed allele so the locus models a homozygote,
    /// and remember that the duplication was inferred rather than observed.
    pub fn treat_as_homozygote(&mut self) -> Result<(), LocusError> {
        if self.alleles.len() != 1 {
            return Err(LocusError::NotSingleAllele { locus: self.name.clone(), len: self.alleles.len() });
        }
        let copy = self.alleles[0].clone();
        self.alleles.push(copy);
        self.homozygote = true;
        self.treated_as_homozygote = true;
        Ok(())
    }

    /// Collapse accidental duplicate alleles and clear the
    /// treated-as-homozygote flag.
    pub fn remove_duplicate_alleles(&mut self) {
        let mut seen: Vec<u32> = Vec::with_capacity(self.alleles.len());
        self.alleles.retain(|allele| {
            if seen.contains(&allele.id()) {
                false
            } else {
                seen.push(allele.id());
                true
            }
        });
        self.homozygote = false;
        self.treated_as_homozygote = false;
    }

    /// Sorted allele ids: the canonical content key used by the per-job
    /// caches, equal for loci carrying the same multiset of alleles.
    pub fn content_key(&self) -> Vec<u32> {
        let mut key: Vec<u32> = self.alleles.iter().map(Allele::id).collect();
        key.sort_unstable();
        key
    }
}

impl PartialEq for Locus {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.content_key() == other.content_key()
    }
}

impl Eq for Locus {}

impl Display for Locus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.alleles.iter().map(Allele::label).collect();
        write!(f, "{}[{}]", self.name, labels.join("/"))
    }
}
