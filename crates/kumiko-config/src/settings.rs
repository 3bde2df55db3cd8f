//! Engine settings file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use kumiko_core::{DEFAULT_MAX_DEPTH, Patcher};

use crate::error::ConfigError;

/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Largest accepted channel count in either direction.
pub const MAX_CHANNELS: usize = 64;

/// Runtime settings for a patcher and its signal driver.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 128
/// input_channels = 2
/// output_channels = 2
/// max_dispatch_depth = 512
/// log_filter = "kumiko_core=debug"
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per signal block.
    pub block_size: usize,
    /// External input channels.
    pub input_channels: usize,
    /// External output channels.
    pub output_channels: usize,
    /// Cap on nested message deliveries.
    pub max_dispatch_depth: usize,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 64,
            input_channels: 2,
            output_channels: 2,
            max_dispatch_depth: DEFAULT_MAX_DEPTH,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the channel counts.
    pub fn with_channels(mut self, inputs: usize, outputs: usize) -> Self {
        self.input_channels = inputs;
        self.output_channels = outputs;
        self
    }

    /// Load settings from a TOML file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Load settings from `path`, or the defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse settings from a TOML string and validate them.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Checks every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(ConfigError::invalid_setting(
                "sample_rate",
                format!("{} is outside 8000..=384000", self.sample_rate),
            ));
        }
        if !(1..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(ConfigError::invalid_setting(
                "block_size",
                format!("{} is outside 1..={MAX_BLOCK_SIZE}", self.block_size),
            ));
        }
        for (field, count) in [
            ("input_channels", self.input_channels),
            ("output_channels", self.output_channels),
        ] {
            if count > MAX_CHANNELS {
                return Err(ConfigError::invalid_setting(
                    field,
                    format!("{count} exceeds {MAX_CHANNELS}"),
                ));
            }
        }
        if self.max_dispatch_depth == 0 {
            return Err(ConfigError::invalid_setting(
                "max_dispatch_depth",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Sample rate as the signal chain expects it.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Applies channel counts and the dispatch depth to `patcher`.
    pub fn apply(&self, patcher: &Patcher) {
        patcher.set_channels(self.input_channels, self.output_channels);
        patcher.set_max_depth(self.max_dispatch_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.block_size, 64);
        assert_eq!((config.input_channels, config.output_channels), (2, 2));
        assert_eq!(config.max_dispatch_depth, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml("block_size = 256\n").unwrap();
        assert_eq!(config.block_size, 256);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default()
            .with_sample_rate(48000)
            .with_block_size(128)
            .with_channels(0, 8);
        let text = config.to_toml().unwrap();
        assert!(!text.contains("log_filter"));
        assert_eq!(EngineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        assert!(EngineConfig::from_toml("block_size = 0").is_err());
        assert!(EngineConfig::from_toml("sample_rate = 10").is_err());
        assert!(EngineConfig::from_toml("output_channels = 1000").is_err());
        assert!(matches!(
            EngineConfig::from_toml("max_dispatch_depth = 0"),
            Err(ConfigError::InvalidSetting {
                field: "max_dispatch_depth",
                ..
            })
        ));
        assert!(matches!(
            EngineConfig::from_toml("block_size = \"big\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
