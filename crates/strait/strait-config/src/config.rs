use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct SoakConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default)]
    pub fifo: FifoSettings,
    #[serde(default)]
    pub run: RunSettings,
}

/// Queue geometry, as the `[fifo]` table.
#[derive(Deserialize, Debug, Clone)]
pub struct FifoSettings {
    #[serde(default = "defaults::addr_bits")]
    pub addr_bits: u32,
    #[serde(default = "defaults::word_bits")]
    pub word_bits: u32,
    #[serde(default = "defaults::sync_stages")]
    pub sync_stages: usize,
    pub almost_full: Option<u64>,
    pub almost_empty: Option<u64>,
}

/// Traffic shape of a soak run, as the `[run]` table.
#[derive(Deserialize, Debug, Clone)]
pub struct RunSettings {
    #[serde(default = "defaults::items")]
    pub items: u64,
    /// Pause the producer after this many pushes; 0 never pauses.
    #[serde(default)]
    pub producer_pause_every: u64,
    /// Pause the consumer after this many pops; 0 never pauses.
    #[serde(default)]
    pub consumer_pause_every: u64,
    #[serde(default = "defaults::pause_us")]
    pub pause_us: u64,
    #[serde(default = "defaults::report_every")]
    pub report_every: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn addr_bits() -> u32 {
        4 // 16 slots
    }

    pub fn word_bits() -> u32 {
        32
    }

    pub fn sync_stages() -> usize {
        2
    }

    pub fn items() -> u64 {
        1_000_000
    }

    pub fn pause_us() -> u64 {
        50
    }

    pub fn report_every() -> u64 {
        250_000
    }
}

impl Default for FifoSettings {
    fn default() -> Self {
        Self {
            addr_bits: defaults::addr_bits(),
            word_bits: defaults::word_bits(),
            sync_stages: defaults::sync_stages(),
            almost_full: None,
            almost_empty: None,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            items: defaults::items(),
            producer_pause_every: 0,
            consumer_pause_every: 0,
            pause_us: defaults::pause_us(),
            report_every: defaults::report_every(),
        }
    }
}

impl SoakConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&toml_to_str)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let soak_config: SoakConfig = toml::from_str(s)?;
        Ok(soak_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_defaults() {
        let cfg = SoakConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.fifo.addr_bits, 4);
        assert_eq!(cfg.fifo.word_bits, 32);
        assert_eq!(cfg.fifo.sync_stages, 2);
        assert_eq!(cfg.fifo.almost_full, None);
        assert_eq!(cfg.run.items, 1_000_000);
        assert_eq!(cfg.run.producer_pause_every, 0);
    }

    #[test]
    fn tables_override_defaults() {
        let cfg = SoakConfig::from_toml_str(
            r#"
            log_level = "debug"

            [fifo]
            addr_bits = 3
            word_bits = 12
            almost_full = 6

            [run]
            items = 5_000
            consumer_pause_every = 100
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.fifo.addr_bits, 3);
        assert_eq!(cfg.fifo.word_bits, 12);
        assert_eq!(cfg.fifo.sync_stages, 2);
        assert_eq!(cfg.fifo.almost_full, Some(6));
        assert_eq!(cfg.run.items, 5_000);
        assert_eq!(cfg.run.consumer_pause_every, 100);
        assert_eq!(cfg.run.pause_us, 50);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SoakConfig::from_toml_str("[fifo]\naddr_bits = \"four\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SoakConfig::load("/nonexistent/strait/soak.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
