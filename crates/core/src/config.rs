//! Configuration structures for the reach feature system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for feature computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session segmentation configuration.
    pub session: SessionConfig,
    /// Publisher configuration.
    pub publishers: PublisherConfig,
    /// Input table configuration.
    pub input: InputConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// Sections missing from the file take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.session.gap_threshold < 0 {
            return Err(Error::config(format!(
                "session.gap_threshold must be >= 0, got {}",
                self.session.gap_threshold
            )));
        }
        if self.publishers.publishers_amount == 0 {
            return Err(Error::config("publishers.publishers_amount must be > 0"));
        }
        if self.input.delimiter == self.input.id_list_separator {
            return Err(Error::config(
                "input.delimiter and input.id_list_separator must differ",
            ));
        }
        Ok(())
    }
}

/// Session segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest gap (in hours) between consecutive events of one session.
    pub gap_threshold: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { gap_threshold: 6 }
    }
}

/// Publisher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Declared number of publishers (ids 1..=publishers_amount).
    pub publishers_amount: u32,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publishers_amount: 21,
        }
    }
}

/// Delimited text input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Column delimiter for history and request tables.
    pub delimiter: char,
    /// Separator inside `user_ids` and `publishers` cells.
    pub id_list_separator: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            id_list_separator: ',',
        }
    }
}
