pub mod statistics;

pub use statistics::{PopulationStatistics, PopStatsError, DEFAULT_RARE_FREQUENCY};
