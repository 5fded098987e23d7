//! Translator and batching configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Identifier and value conventions of the Oracle dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    /// Fold identifiers to upper case.
    pub uppercase: bool,
    /// Wrap identifiers in double quotes.
    pub wrap_with_quotes: bool,
    /// Bind UUIDs as RAW(16) bytes.
    pub formatting_guid: bool,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            uppercase: true,
            wrap_with_quotes: true,
            formatting_guid: false,
        }
    }
}

/// Thresholds for grouping statements into one round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub group_statements_count: i64,
    pub group_parameters_count: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            group_statements_count: 1000,
            group_parameters_count: 2000,
        }
    }
}

impl BatchConfig {
    /// Statement threshold, at least 1.
    pub fn statements_threshold(&self) -> usize {
        self.group_statements_count.max(1) as usize
    }

    /// Parameter threshold, at least 1.
    pub fn parameters_threshold(&self) -> usize {
        self.group_parameters_count.max(1) as usize
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oracle: OracleOptions,
    pub batch: BatchConfig,
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// `<config_dir>/qail-oracle/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qail-oracle").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(_) => Ok(Self::default()),
            None => Err(Error::Config("no configuration directory on this platform".into())),
        }
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn uppercase(mut self, on: bool) -> Self {
        self.config.oracle.uppercase = on;
        self
    }

    pub fn wrap_with_quotes(mut self, on: bool) -> Self {
        self.config.oracle.wrap_with_quotes = on;
        self
    }

    pub fn formatting_guid(mut self, on: bool) -> Self {
        self.config.oracle.formatting_guid = on;
        self
    }

    pub fn group_statements(mut self, count: i64) -> Self {
        self.config.batch.group_statements_count = count;
        self
    }

    pub fn group_parameters(mut self, count: i64) -> Self {
        self.config.batch.group_parameters_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
