use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("Candidate genotype at locus '{locus}' carries {len} alleles instead of 2")]
    MalformedGenotype { locus: String, len: usize },

    #[error("Reference locus '{locus}' carries {len} alleles; a reference genotype needs 1 or 2")]
    MalformedReference { locus: String, len: usize },
}
