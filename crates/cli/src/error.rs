use burnstats_core::config::ConfigError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BurnstatsError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("core error")]
    Core(#[from] burnstats_core::Error),

    #[error("db error")]
    Db(#[from] burnstats_sqlite::Error),

    #[error("database file '{0}' does not exist")]
    #[diagnostic(help("point --db (or BURNSTATS_DB) at a block_stats database"))]
    DbDoesNotExist(String),

    #[error("no block_stats table in '{0}'")]
    #[diagnostic(help("point --db (or BURNSTATS_DB) at the database written by the block indexer"))]
    NoBlockStatsTable(String),

    #[error("refusing to overwrite '{}'", .0.display())]
    ExportTargetExists(PathBuf),

    #[error("report error")]
    Report(#[from] burnstats_report::Error),
}
