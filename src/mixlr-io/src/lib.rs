pub mod read;

pub use read::frequencies::{read_statistics, FrequencyReaderError};
pub use read::samples::{read_samples, SampleReaderError};
