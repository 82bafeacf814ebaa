#[cfg(test)]
mod fixture;
pub use fixture::{default_statistics, mock_sample, mock_statistics, ConfigBuilder};

#[cfg(test)]
mod listener;
pub use listener::RecordingListener;
