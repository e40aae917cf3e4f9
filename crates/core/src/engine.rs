use crate::config::AnalysisConfig;
use crate::record::{BlockRecord, DecodeError, RawBlockStats};
use crate::summary::ThresholdSummary;
use crate::tracker::{Threshold, ThresholdTracker};
use std::collections::BTreeMap;

/// Feeds blocks to one [`ThresholdTracker`] per threshold.
///
/// Blocks must be processed in strictly increasing block-number order. `latest_block_number` is
/// the highest block of the dataset; reaching it closes every streak still in progress.
#[derive(Clone, Debug)]
pub struct AggregationEngine {
    latest_block_number: u64,
    total_blocks_processed: u64,
    trackers: BTreeMap<Threshold, ThresholdTracker>,
}

impl AggregationEngine {
    pub fn new(latest_block_number: u64, thresholds: impl IntoIterator<Item = Threshold>) -> Self {
        Self::from_trackers(
            latest_block_number,
            thresholds.into_iter().map(ThresholdTracker::new),
        )
    }

    pub fn from_config(latest_block_number: u64, config: &AnalysisConfig) -> Self {
        Self::from_trackers(
            latest_block_number,
            config.thresholds.iter().map(|threshold| {
                ThresholdTracker::new(*threshold)
                    .with_min_run_length(config.min_run_length)
                    .with_boundary_mode(config.boundary_mode)
            }),
        )
    }

    fn from_trackers(
        latest_block_number: u64,
        trackers: impl IntoIterator<Item = ThresholdTracker>,
    ) -> Self {
        Self {
            latest_block_number,
            total_blocks_processed: 0,
            trackers: trackers
                .into_iter()
                .map(|tracker| (tracker.threshold(), tracker))
                .collect(),
        }
    }

    pub fn process(&mut self, record: &BlockRecord) {
        self.total_blocks_processed += 1;
        for tracker in self.trackers.values_mut() {
            tracker.observe(record, self.latest_block_number);
        }
    }

    /// Decodes and processes a stored row. A row that fails to decode is not counted.
    pub fn process_raw(&mut self, raw: &RawBlockStats) -> Result<(), DecodeError> {
        let record = raw.decode()?;
        self.process(&record);
        Ok(())
    }

    /// Closes the streaks still in progress when the data ran out before the latest block.
    pub fn flush(&mut self) {
        for tracker in self.trackers.values_mut() {
            tracker.flush();
        }
    }

    pub fn latest_block_number(&self) -> u64 {
        self.latest_block_number
    }

    pub fn total_blocks_processed(&self) -> u64 {
        self.total_blocks_processed
    }

    pub fn thresholds(&self) -> impl Iterator<Item = Threshold> + '_ {
        self.trackers.keys().copied()
    }

    pub fn tracker(&self, threshold: Threshold) -> Option<&ThresholdTracker> {
        self.trackers.get(&threshold)
    }

    pub fn summary(&self, threshold: Threshold) -> Option<ThresholdSummary> {
        self.tracker(threshold)
            .map(|tracker| ThresholdSummary::new(tracker, self.total_blocks_processed))
    }

    /// Summaries for every threshold, in ascending threshold order.
    pub fn summaries(&self) -> Vec<ThresholdSummary> {
        self.trackers
            .values()
            .map(|tracker| ThresholdSummary::new(tracker, self.total_blocks_processed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryMode;
    use crate::record::{BlockField, DecodeErrorKind};
    use crate::test_utils::{blocks_with_utilization, BlockBuilder};

    fn t(percent: u8) -> Threshold {
        Threshold::new(percent).unwrap()
    }

    fn engine_for(blocks: &[BlockRecord], thresholds: &[u8]) -> AggregationEngine {
        let latest = blocks.last().map(|b| b.number).unwrap_or(0);
        let mut engine = AggregationEngine::new(latest, thresholds.iter().map(|p| t(*p)));
        for block in blocks {
            engine.process(block);
        }
        engine
    }

    #[test]
    fn summarizes_reference_scenario() {
        let blocks = blocks_with_utilization(1, &[92, 94, 97, 93, 20]);
        let engine = engine_for(&blocks, &[90]);

        let summary = engine.summary(t(90)).unwrap();
        assert_eq!(summary.total_blocks, 5);
        assert_eq!(summary.full_block_count, 4);
        assert_eq!(summary.qualifying_run_count, 1);
        assert_eq!(summary.percent_full, 80.0);
        assert_eq!(summary.qualifying_run_rate, 20.0);

        let best = summary.best_streak.unwrap();
        assert_eq!((best.start_block, best.end_block, best.span), (1, 5, 4));
        // base fee is `number` gwei
        assert_eq!(best.base_fee.total_display(), 15.0);
        assert_eq!(best.base_fee.average, Some(3.75));
    }

    #[test]
    fn thresholds_are_independent() {
        let blocks = blocks_with_utilization(1, &[96, 96, 96, 96, 96, 91, 91, 91, 91, 91, 50]);
        let engine = engine_for(&blocks, &[99, 90, 95]);

        assert_eq!(
            engine.thresholds().collect::<Vec<_>>(),
            vec![t(90), t(95), t(99)]
        );

        let at_90 = engine.summary(t(90)).unwrap();
        assert_eq!(at_90.full_block_count, 10);
        assert_eq!(at_90.best_streak.unwrap().span, 10);

        let at_95 = engine.summary(t(95)).unwrap();
        assert_eq!(at_95.full_block_count, 5);
        assert_eq!(at_95.best_streak.unwrap().end_block, 6);

        let at_99 = engine.summary(t(99)).unwrap();
        assert_eq!(at_99.full_block_count, 0);
        assert_eq!(at_99.qualifying_run_count, 0);
        assert!(at_99.best_streak.is_none());

        assert!(engine.summary(t(80)).is_none());
        for summary in engine.summaries() {
            assert!(summary.full_block_count <= engine.total_blocks_processed());
        }
    }

    #[test]
    fn replay_is_deterministic() {
        let blocks =
            blocks_with_utilization(40, &[91, 99, 97, 100, 3, 96, 92, 95, 98, 97, 12, 93]);
        let first = engine_for(&blocks, &[90, 95, 99]).summaries();
        let second = engine_for(&blocks, &[90, 95, 99]).summaries();
        assert_eq!(first, second);
    }

    #[test]
    fn final_streak_is_flushed() {
        let blocks = blocks_with_utilization(1, &[10, 95, 95, 95, 95, 95]);
        let engine = engine_for(&blocks, &[90]);
        let best = engine.summary(t(90)).unwrap().best_streak.unwrap();
        assert_eq!((best.start_block, best.end_block), (2, 6));
    }

    #[test]
    fn config_sets_tracker_options() {
        let config = AnalysisConfig {
            thresholds: vec![t(90)],
            min_run_length: 1,
            boundary_mode: BoundaryMode::Exclusive,
            ..Default::default()
        };
        let mut engine = AggregationEngine::from_config(3, &config);
        for block in blocks_with_utilization(1, &[95, 95, 0]) {
            engine.process(&block);
        }
        let tracker = engine.tracker(t(90)).unwrap();
        assert_eq!(tracker.min_run_length(), 1);
        let best = tracker.best_streak().unwrap();
        assert_eq!((best.start_block, best.end_block), (1, 2));
    }

    #[test]
    fn undecodable_rows_are_not_counted() {
        let mut engine = AggregationEngine::new(2, [t(90)]);
        let mut bad = BlockBuilder::new(1).raw();
        bad.burned = "0x".to_owned();

        let err = engine.process_raw(&bad).unwrap_err();
        assert_eq!(err.field, BlockField::Burned);
        assert_eq!(err.kind, DecodeErrorKind::NoDigits);
        assert_eq!(engine.total_blocks_processed(), 0);

        engine
            .process_raw(&BlockBuilder::new(2).utilization(95).raw())
            .unwrap();
        assert_eq!(engine.total_blocks_processed(), 1);
        assert_eq!(engine.summary(t(90)).unwrap().full_block_count, 1);
    }

    #[test]
    fn empty_engine_reports_zeroes() {
        let engine = AggregationEngine::new(0, [t(90)]);
        let summary = engine.summary(t(90)).unwrap();
        assert_eq!(summary.total_blocks, 0);
        assert_eq!(summary.percent_full, 0.0);
        assert!(summary.best_streak.is_none());
    }
}
