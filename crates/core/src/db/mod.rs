mod error;
mod mock;

pub use error::DbError;
pub use mock::{MockDb, MockError};

use crate::record::RawBlockStats;

/// Storage of `block_stats` rows, keyed by block number.
pub trait DbOps {
    type Error: Into<DbError>;

    fn create_tables(&self) -> Result<(), Self::Error>;

    fn version(&self) -> u64;

    /// Highest block number in `block_stats`, or `None` when the table is empty.
    fn latest_block_number(&self) -> Result<Option<u64>, Self::Error>;

    fn num_block_stats(&self) -> Result<u64, Self::Error>;

    /// Returns up to `limit` rows ordered by block number, starting after block `after`
    /// (from the first row when `after` is `None`).
    fn get_block_stats(
        &self,
        after: Option<u64>,
        limit: u64,
    ) -> Result<Vec<RawBlockStats>, Self::Error>;

    /// Insert rows into `block_stats`, replacing rows with the same block number.
    fn insert_block_stats(&self, rows: &[RawBlockStats]) -> Result<(), Self::Error>;
}
