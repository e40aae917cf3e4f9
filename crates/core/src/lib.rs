pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod record;
pub mod streak;
pub mod summary;
pub mod test_utils;
pub mod tracker;
pub mod units;

pub use analysis::{analyze, AnalysisReport};
pub use config::AnalysisConfig;
pub use engine::AggregationEngine;
pub use error::Error;
pub use record::{BlockRecord, RawBlockStats};
pub use tracker::Threshold;

pub type Result<T> = std::result::Result<T, Error>;
