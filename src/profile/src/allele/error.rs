use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlleleError {
    #[error("Allele designation is empty after normalization")]
    EmptyLabel,

    #[error("Allele '{label}' already belongs to locus '{from}' and cannot be moved to '{to}'")]
    Reparented { label: String, from: String, to: String },
}
