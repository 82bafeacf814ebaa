use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContributorError {
    #[error("Dropout probability {0} is outside the [0, 1] interval")]
    InvalidDropout(f64),
}
