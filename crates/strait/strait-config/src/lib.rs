mod config;

pub use config::{ConfigError, FifoSettings, RunSettings, SoakConfig};
