use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopStatsError {
    #[error("Frequency {0} is outside the [0, 1] interval")]
    InvalidFrequency(f64),
}
