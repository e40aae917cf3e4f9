use crate::{Error, Result, DB_VERSION};
use burnstats_core::{db::DbOps, RawBlockStats};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, types::FromSql, Row};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
struct SqliteConnectionCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error>
    for SqliteConnectionCustomizer
{
    fn on_acquire(
        &self,
        conn: &mut rusqlite::Connection,
    ) -> std::result::Result<(), rusqlite::Error> {
        // WAL lets the analysis read while the indexer keeps appending blocks.
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteDb {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteDb {
    pub fn from_file(file: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(file);
        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)?;
        Ok(Self { pool })
    }

    /// Every pooled connection to `:memory:` would open its own database, so the pool holds one.
    pub fn new_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)?;
        Ok(Self { pool })
    }

    fn get_pool(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn execute<P: rusqlite::Params>(&self, query: &str, params: P) -> Result<()> {
        self.get_pool()?.execute(query, params)?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists: bool = self
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                params![table_name],
                |_| Ok(true),
            )
            .unwrap_or(false);
        Ok(exists)
    }

    /// Writes a consistent copy of the database, including pages still in the WAL, to `path`.
    /// Fails if `path` already exists.
    pub fn export_to(&self, path: &str) -> Result<()> {
        self.execute("VACUUM INTO ?1", params![path])?;
        debug!("exported database to {path}");
        Ok(())
    }

    fn query_row<
        T: FromSql,
        P: rusqlite::Params,
        F: FnOnce(&Row<'_>) -> std::result::Result<T, rusqlite::Error>,
    >(
        &self,
        query: &str,
        params: P,
        with_row: F,
    ) -> Result<T> {
        debug!("executing query: {query}");
        Ok(self.get_pool()?.query_row(query, params, with_row)?)
    }
}

const BLOCK_STATS_COLUMNS: &str = "number, timestamp, base_fee, burned, gas_target, gas_used, \
     priority_fee, rewards, tips, transactions, type2_transactions";

fn block_stats_from_row(row: &Row) -> rusqlite::Result<RawBlockStats> {
    Ok(RawBlockStats {
        number: row.get(0)?,
        timestamp: row.get(1)?,
        base_fee: row.get(2)?,
        burned: row.get(3)?,
        gas_target: row.get(4)?,
        gas_used: row.get(5)?,
        priority_fee: row.get(6)?,
        rewards: row.get(7)?,
        tips: row.get(8)?,
        transactions: row.get(9)?,
        type2_transactions: row.get(10)?,
    })
}

impl DbOps for SqliteDb {
    type Error = Error;

    fn create_tables(&self) -> Result<()> {
        let set_version = format!("PRAGMA user_version = {DB_VERSION};");
        let queries = [
            set_version.as_str(),
            "CREATE TABLE IF NOT EXISTS block_stats (
                number INTEGER PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                base_fee TEXT NOT NULL,
                burned TEXT NOT NULL,
                gas_target TEXT NOT NULL,
                gas_used TEXT NOT NULL,
                priority_fee TEXT NOT NULL,
                rewards TEXT NOT NULL,
                tips TEXT NOT NULL,
                transactions TEXT NOT NULL,
                type2_transactions TEXT NOT NULL
            )",
        ];

        for query in queries {
            self.execute(query, params![])?;
        }

        Ok(())
    }

    fn version(&self) -> u64 {
        self.query_row("PRAGMA user_version", params![], |row| row.get(0))
            .unwrap_or(0)
    }

    fn latest_block_number(&self) -> Result<Option<u64>> {
        self.query_row("SELECT MAX(number) FROM block_stats", params![], |row| {
            row.get(0)
        })
    }

    fn num_block_stats(&self) -> Result<u64> {
        self.query_row("SELECT COUNT(*) FROM block_stats", params![], |row| {
            row.get(0)
        })
    }

    fn get_block_stats(&self, after: Option<u64>, limit: u64) -> Result<Vec<RawBlockStats>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(&format!(
            "SELECT {BLOCK_STATS_COLUMNS} FROM block_stats
                WHERE ?1 IS NULL OR number > ?1
                ORDER BY number ASC LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![after, limit], block_stats_from_row)?;
        let res = rows
            .map(|r| r.map_err(|e| e.into()))
            .collect::<Result<Vec<RawBlockStats>>>()?;
        Ok(res)
    }

    fn insert_block_stats(&self, rows: &[RawBlockStats]) -> Result<()> {
        let mut conn = self.get_pool()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO block_stats ({BLOCK_STATS_COLUMNS})
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.number,
                    row.timestamp,
                    &row.base_fee,
                    &row.burned,
                    &row.gas_target,
                    &row.gas_used,
                    &row.priority_fee,
                    &row.rewards,
                    &row.tips,
                    &row.transactions,
                    &row.type2_transactions,
                ])?;
            }
        }

        tx.commit()?;
        debug!("inserted {} block_stats rows", rows.len());
        Ok(())
    }
}
