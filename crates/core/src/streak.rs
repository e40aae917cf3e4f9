use crate::aggregate::RunningAggregate;
use crate::record::BlockRecord;

/// Aggregates over a contiguous range of blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakState {
    pub start_block: u64,
    pub end_block: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub burned: RunningAggregate,
    pub rewards: RunningAggregate,
    pub tips: RunningAggregate,
    pub base_fee: RunningAggregate,
    pub priority_fee: RunningAggregate,
    pub total_transactions: u64,
    pub total_type2_transactions: u64,
}

impl StreakState {
    pub fn new(record: &BlockRecord) -> Self {
        Self {
            start_block: record.number,
            end_block: record.number,
            start_timestamp: record.timestamp,
            end_timestamp: record.timestamp,
            burned: RunningAggregate::new(&record.burned),
            rewards: RunningAggregate::new(&record.rewards),
            tips: RunningAggregate::new(&record.tips),
            base_fee: RunningAggregate::new(&record.base_fee),
            priority_fee: RunningAggregate::new(&record.priority_fee),
            total_transactions: record.transactions,
            total_type2_transactions: record.type2_transactions,
        }
    }

    pub fn extend(&mut self, record: &BlockRecord) {
        self.end_block = record.number;
        self.end_timestamp = record.timestamp;
        self.burned.update(&record.burned);
        self.rewards.update(&record.rewards);
        self.tips.update(&record.tips);
        self.base_fee.update(&record.base_fee);
        self.priority_fee.update(&record.priority_fee);
        self.total_transactions = self.total_transactions.saturating_add(record.transactions);
        self.total_type2_transactions = self
            .total_type2_transactions
            .saturating_add(record.type2_transactions);
    }

    /// `end_block - start_block`; a single-block streak has span 0.
    pub fn span(&self) -> u64 {
        self.end_block.saturating_sub(self.start_block)
    }
}

/// The in-progress streak of a tracker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Streak {
    #[default]
    Idle,
    Active(StreakState),
}

impl Streak {
    /// Starts a streak at `record` when idle, otherwise extends the active one.
    pub fn extend(&mut self, record: &BlockRecord) {
        match self {
            Streak::Idle => *self = Streak::Active(StreakState::new(record)),
            Streak::Active(state) => state.extend(record),
        }
    }

    /// Ends the streak, leaving `Idle` behind.
    pub fn close(&mut self) -> Option<StreakState> {
        match std::mem::take(self) {
            Streak::Idle => None,
            Streak::Active(state) => Some(state),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Streak::Active(_))
    }
}
