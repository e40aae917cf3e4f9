use crate::tracker::{Threshold, DEFAULT_MIN_RUN_LENGTH, DEFAULT_THRESHOLDS};
use serde::{Deserialize, Serialize};
use std::fs::read;
use std::path::{Path, PathBuf};
use strum::Display;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Whether the block that breaks a run belongs to the streak it closes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryMode {
    /// Every block is folded into the current streak before it is classified, so a streak ends
    /// at (and includes) the block that broke it.
    #[default]
    Inclusive,
    /// Only full blocks are folded into the current streak.
    Exclusive,
}

/// What the analysis does with a row that fails to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold must be between 0 and 100, got {0}")]
    ThresholdOutOfRange(u64),

    #[error("invalid threshold '{0}'")]
    ThresholdInvalid(String),

    #[error("at least one threshold is required")]
    NoThresholds,

    #[error("page_size must be greater than zero")]
    PageSizeZero,

    #[error("failed to read config file {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Analysis settings. Defines the TOML schema for config files; every key is optional.
///
/// ```toml
/// thresholds = [90, 95, 99]
/// min_run_length = 3
/// boundary_mode = "inclusive"
/// on_decode_error = "abort"
/// page_size = 10000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Utilization percentages to analyze, each tracked independently.
    pub thresholds: Vec<Threshold>,

    /// A run must contain more than this many full blocks to qualify.
    pub min_run_length: u64,

    pub boundary_mode: BoundaryMode,

    pub on_decode_error: DecodeErrorPolicy,

    /// Number of rows fetched from storage per query.
    pub page_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            boundary_mode: BoundaryMode::default(),
            on_decode_error: DecodeErrorPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_path = file_path.as_ref();
        let contents = read(file_path).map_err(|e| ConfigError::Io(file_path.to_owned(), e))?;
        Self::from_toml_str(&String::from_utf8_lossy(&contents))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn encode_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.is_empty() {
            return Err(ConfigError::NoThresholds);
        }
        if self.page_size == 0 {
            return Err(ConfigError::PageSizeZero);
        }
        Ok(())
    }
}
