use crate::config::{BoundaryMode, ConfigError};
use crate::record::BlockRecord;
use crate::streak::{Streak, StreakState};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, trace};

/// A run must be strictly longer than this many full blocks to qualify.
pub const DEFAULT_MIN_RUN_LENGTH: u64 = 3;

/// Utilization percentage a block has to exceed to count as full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Threshold(u8);

pub const DEFAULT_THRESHOLDS: [Threshold; 3] = [Threshold(90), Threshold(95), Threshold(99)];

impl Threshold {
    pub fn new(percent: u8) -> Result<Self, ConfigError> {
        if percent > 100 {
            return Err(ConfigError::ThresholdOutOfRange(percent.into()));
        }
        Ok(Self(percent))
    }

    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Threshold {
    type Error = ConfigError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl From<Threshold> for u8 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

impl FromStr for Threshold {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let percent = trimmed
            .parse::<u64>()
            .map_err(|_| ConfigError::ThresholdInvalid(s.to_owned()))?;
        let percent =
            u8::try_from(percent).map_err(|_| ConfigError::ThresholdOutOfRange(percent))?;
        Self::new(percent)
    }
}

impl Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Full-block bookkeeping for a single threshold.
///
/// Every record is folded into the current streak before it is classified (see
/// [`BoundaryMode`]). A record that is not full breaks the run; a break, or reaching the latest
/// block of the dataset, closes the current streak. A closed streak whose run was longer than
/// `min_run_length` counts as a qualifying run and replaces the best streak when its span is
/// strictly larger.
#[derive(Clone, Debug)]
pub struct ThresholdTracker {
    threshold: Threshold,
    min_run_length: u64,
    boundary_mode: BoundaryMode,
    current: Streak,
    best: Option<StreakState>,
    full_block_count: u64,
    in_run_length: u64,
    qualifying_run_count: u64,
}

impl ThresholdTracker {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            boundary_mode: BoundaryMode::default(),
            current: Streak::Idle,
            best: None,
            full_block_count: 0,
            in_run_length: 0,
            qualifying_run_count: 0,
        }
    }

    pub fn with_min_run_length(mut self, min_run_length: u64) -> Self {
        self.min_run_length = min_run_length;
        self
    }

    pub fn with_boundary_mode(mut self, boundary_mode: BoundaryMode) -> Self {
        self.boundary_mode = boundary_mode;
        self
    }

    pub fn is_full(&self, record: &BlockRecord) -> bool {
        record.utilization_percent() > f64::from(self.threshold.percent())
    }

    /// Feeds the next block. `latest_block` is the highest block number of the dataset.
    pub fn observe(&mut self, record: &BlockRecord, latest_block: u64) {
        let full = self.is_full(record);

        if full || self.boundary_mode == BoundaryMode::Inclusive {
            self.current.extend(record);
        }

        if full {
            self.full_block_count += 1;
            self.in_run_length += 1;
        }

        let run_broken = !full;
        if run_broken || record.number >= latest_block {
            self.close_streak(run_broken);
        }
    }

    /// Closes a streak still in progress at the end of the data, without breaking the run.
    ///
    /// Needed when the dataset ends before a processed record reaches the latest block, e.g.
    /// when the highest rows were skipped. A no-op once the streak was closed by `observe`.
    pub fn flush(&mut self) {
        if self.current.is_active() {
            self.close_streak(false);
        }
    }

    fn close_streak(&mut self, run_broken: bool) {
        let closed = self.current.close();

        if self.in_run_length > self.min_run_length {
            self.qualifying_run_count += 1;
            if let Some(streak) = closed {
                trace!(
                    threshold = %self.threshold,
                    start = streak.start_block,
                    end = streak.end_block,
                    run_length = self.in_run_length,
                    "qualifying run closed"
                );
                let longer = self
                    .best
                    .as_ref()
                    .is_none_or(|best| streak.span() > best.span());
                if longer {
                    debug!(
                        threshold = %self.threshold,
                        start = streak.start_block,
                        end = streak.end_block,
                        span = streak.span(),
                        "new longest streak"
                    );
                    self.best = Some(streak);
                }
            }
        }

        if run_broken {
            self.in_run_length = 0;
        }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn min_run_length(&self) -> u64 {
        self.min_run_length
    }

    pub fn full_block_count(&self) -> u64 {
        self.full_block_count
    }

    pub fn qualifying_run_count(&self) -> u64 {
        self.qualifying_run_count
    }

    pub fn in_run_length(&self) -> u64 {
        self.in_run_length
    }

    pub fn current_streak(&self) -> &Streak {
        &self.current
    }

    pub fn best_streak(&self) -> Option<&StreakState> {
        self.best.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{blocks_with_utilization, BlockBuilder};
    use num_bigint::BigUint;

    fn t(percent: u8) -> Threshold {
        Threshold::new(percent).unwrap()
    }

    fn run(tracker: &mut ThresholdTracker, blocks: &[BlockRecord]) {
        let latest = blocks.last().map(|b| b.number).unwrap_or(0);
        for block in blocks {
            tracker.observe(block, latest);
        }
    }

    #[test]
    fn parses_thresholds() {
        assert_eq!("95".parse::<Threshold>().unwrap(), t(95));
        assert_eq!(" 99% ".parse::<Threshold>().unwrap(), t(99));
        assert!(matches!(
            "101".parse::<Threshold>(),
            Err(ConfigError::ThresholdOutOfRange(101))
        ));
        assert!(matches!(
            "300".parse::<Threshold>(),
            Err(ConfigError::ThresholdOutOfRange(300))
        ));
        assert!(matches!(
            "ninety".parse::<Threshold>(),
            Err(ConfigError::ThresholdInvalid(_))
        ));
        assert_eq!(t(90).to_string(), "90%");
    }

    #[test]
    fn breaking_block_is_folded_into_streak() {
        let blocks = blocks_with_utilization(1, &[92, 94, 97, 93, 20]);
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);

        assert_eq!(tracker.full_block_count(), 4);
        assert_eq!(tracker.qualifying_run_count(), 1);
        assert_eq!(tracker.in_run_length(), 0);
        assert!(!tracker.current_streak().is_active());

        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (1, 5));
        assert_eq!(best.span(), 4);
        // transactions are 100 + number for blocks 1..=5
        assert_eq!(best.total_transactions, 515);
        assert_eq!(best.base_fee.max, BigUint::from(5_000_000_000u64));
    }

    #[test]
    fn exclusive_mode_ends_streak_at_last_full_block() {
        let blocks = blocks_with_utilization(1, &[92, 94, 97, 93, 20]);
        let mut tracker = ThresholdTracker::new(t(90)).with_boundary_mode(BoundaryMode::Exclusive);
        run(&mut tracker, &blocks);

        assert_eq!(tracker.full_block_count(), 4);
        assert_eq!(tracker.qualifying_run_count(), 1);
        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (1, 4));
        assert_eq!(best.span(), 3);
        assert_eq!(best.total_transactions, 410);
        assert_eq!(best.base_fee.max, BigUint::from(4_000_000_000u64));
    }

    #[test]
    fn run_of_exactly_min_length_does_not_qualify() {
        let blocks = blocks_with_utilization(1, &[95, 95, 95, 10, 95, 10]);
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);

        assert_eq!(tracker.full_block_count(), 4);
        assert_eq!(tracker.qualifying_run_count(), 0);
        assert!(tracker.best_streak().is_none());
    }

    #[test]
    fn unbroken_run_is_flushed_at_latest_block() {
        let blocks = blocks_with_utilization(100, &[10, 91, 92, 93, 94, 95, 96]);
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);

        assert_eq!(tracker.qualifying_run_count(), 1);
        assert_eq!(tracker.in_run_length(), 6);
        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (101, 106));
    }

    #[test]
    fn unbroken_run_is_dropped_without_latest_block() {
        let blocks = blocks_with_utilization(1, &[91, 92, 93, 94, 95]);
        let mut tracker = ThresholdTracker::new(t(90));
        for block in &blocks {
            tracker.observe(block, u64::MAX);
        }
        assert!(tracker.best_streak().is_none());
        assert!(tracker.current_streak().is_active());

        tracker.flush();
        assert_eq!(tracker.qualifying_run_count(), 1);
        assert_eq!(tracker.in_run_length(), 5);
        assert!(!tracker.current_streak().is_active());
        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (1, 5));
    }

    #[test]
    fn flush_after_latest_block_counts_nothing_twice() {
        let blocks = blocks_with_utilization(1, &[91, 92, 93, 94, 95]);
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);
        assert_eq!(tracker.qualifying_run_count(), 1);

        tracker.flush();
        assert_eq!(tracker.qualifying_run_count(), 1);
        assert_eq!(tracker.best_streak().unwrap().end_block, 5);
    }

    #[test]
    fn longest_span_wins_and_ties_keep_first() {
        let blocks = blocks_with_utilization(
            1,
            &[
                95, 95, 95, 95, 0, // 1..=5, span 4
                95, 95, 95, 95, 95, 95, 0, // 6..=12, span 6
                95, 95, 95, 95, 95, 95, 0, // 13..=19, span 6
            ],
        );
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);

        assert_eq!(tracker.qualifying_run_count(), 3);
        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (6, 12));
    }

    #[test]
    fn zero_gas_target_is_never_full() {
        let block = BlockBuilder::new(1).gas(30_000_000, 0).build();
        for percent in [1, 50, 90, 100] {
            let tracker = ThresholdTracker::new(t(percent));
            assert!(!tracker.is_full(&block));
        }
        assert!(ThresholdTracker::new(t(0)).is_full(&BlockBuilder::new(1).utilization(1).build()));
    }

    #[test]
    fn utilization_equal_to_threshold_is_not_full() {
        let tracker = ThresholdTracker::new(t(90));
        let block = BlockBuilder::new(1).gas(27_000_000, 15_000_000).build();
        assert!(!tracker.is_full(&block));
    }

    #[test]
    fn custom_min_run_length() {
        let blocks = blocks_with_utilization(1, &[95, 95, 0]);
        let mut tracker = ThresholdTracker::new(t(90)).with_min_run_length(1);
        run(&mut tracker, &blocks);
        assert_eq!(tracker.min_run_length(), 1);
        assert_eq!(tracker.qualifying_run_count(), 1);
        assert_eq!(tracker.best_streak().unwrap().span(), 2);
    }

    #[test]
    fn best_streak_aggregates_bound_every_sample() {
        let blocks = blocks_with_utilization(1, &[99, 91, 97, 93, 96, 20, 95]);
        let mut tracker = ThresholdTracker::new(t(90));
        run(&mut tracker, &blocks);

        let best = tracker.best_streak().unwrap();
        for block in blocks
            .iter()
            .filter(|b| (best.start_block..=best.end_block).contains(&b.number))
        {
            assert!(best.burned.min <= block.burned && block.burned <= best.burned.max);
            assert!(best.tips.min <= block.tips && block.tips <= best.tips.max);
            assert!(best.base_fee.min <= block.base_fee && block.base_fee <= best.base_fee.max);
        }
        assert!(tracker.full_block_count() <= blocks.len() as u64);
    }
}
