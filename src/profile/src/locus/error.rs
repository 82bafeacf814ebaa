use thiserror::Error;

use crate::allele::AlleleError;

#[derive(Debug, Error)]
pub enum LocusError {
    #[error(transparent)]
    Allele(#[from] AlleleError),

    #[error("Locus '{locus}' carries {len} alleles; only a single observed allele can be treated as homozygote")]
    NotSingleAllele { locus: String, len: usize },
}
