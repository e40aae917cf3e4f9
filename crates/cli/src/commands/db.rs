use crate::{commands::Result, error::BurnstatsError};
use burnstats_core::db::DbOps;
use burnstats_sqlite::{SqliteDb, DB_VERSION};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of a block_stats database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInfo {
    pub version: u64,
    pub num_blocks: u64,
    pub latest_block: Option<u64>,
}

/// Opens an existing block_stats database without writing to it.
pub fn open_block_stats_db(db_path: &str) -> Result<SqliteDb> {
    if !Path::new(db_path).exists() {
        return Err(BurnstatsError::DbDoesNotExist(db_path.to_owned()));
    }
    let db = SqliteDb::from_file(db_path)?;
    if !db.table_exists("block_stats")? {
        return Err(BurnstatsError::NoBlockStatsTable(db_path.to_owned()));
    }

    let version = db.version();
    if version != DB_VERSION {
        warn!("database schema version is {version}, expected {DB_VERSION}");
    }
    Ok(db)
}

/// Log the schema version, row count and latest block of the database
pub fn info_db(db_path: &str) -> Result<DbInfo> {
    let db = open_block_stats_db(db_path)?;
    let info = DbInfo {
        version: db.version(),
        num_blocks: db.num_block_stats()?,
        latest_block: db.latest_block_number()?,
    };

    match info.latest_block {
        Some(latest) => info!(
            "'{db_path}': schema version {}, {} blocks, latest block {latest}",
            info.version, info.num_blocks
        ),
        None => info!("'{db_path}': schema version {}, no blocks", info.version),
    }
    Ok(info)
}

/// Export a consistent snapshot of the database to a new file
pub fn export_db(db_path: &str, target_path: PathBuf) -> Result<()> {
    let db = open_block_stats_db(db_path)?;
    if target_path.exists() {
        return Err(BurnstatsError::ExportTargetExists(target_path));
    }

    db.export_to(&target_path.to_string_lossy())?;
    info!("Database exported to '{}'", target_path.display());
    Ok(())
}
