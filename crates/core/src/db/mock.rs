use super::DbOps;
use crate::{db::DbError, record::RawBlockStats};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;

/// In-memory `block_stats` table.
#[derive(Debug, Default)]
pub struct MockDb {
    rows: RefCell<BTreeMap<u64, RawBlockStats>>,
}

impl MockDb {
    pub fn new(rows: impl IntoIterator<Item = RawBlockStats>) -> Self {
        Self {
            rows: RefCell::new(rows.into_iter().map(|row| (row.number, row)).collect()),
        }
    }
}

#[derive(Debug)]
pub enum MockError {}

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mock error")
    }
}

impl std::error::Error for MockError {}

impl From<MockError> for DbError {
    fn from(value: MockError) -> Self {
        DbError::Internal(value.to_string())
    }
}

impl From<MockError> for crate::Error {
    fn from(value: MockError) -> Self {
        Self::Db(value.into())
    }
}

impl DbOps for MockDb {
    type Error = MockError;

    fn create_tables(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn version(&self) -> u64 {
        u64::MAX
    }

    fn latest_block_number(&self) -> Result<Option<u64>, Self::Error> {
        Ok(self.rows.borrow().keys().next_back().copied())
    }

    fn num_block_stats(&self) -> Result<u64, Self::Error> {
        Ok(self.rows.borrow().len() as u64)
    }

    fn get_block_stats(
        &self,
        after: Option<u64>,
        limit: u64,
    ) -> Result<Vec<RawBlockStats>, Self::Error> {
        let rows = self.rows.borrow();
        let start = after.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(rows
            .range((start, Bound::Unbounded))
            .take(limit as usize)
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn insert_block_stats(&self, rows: &[RawBlockStats]) -> Result<(), Self::Error> {
        let mut table = self.rows.borrow_mut();
        for row in rows {
            table.insert(row.number, row.clone());
        }
        Ok(())
    }
}
