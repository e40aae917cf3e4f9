use crate::aggregate::RunningAggregate;
use crate::streak::StreakState;
use crate::tracker::{Threshold, ThresholdTracker};
use crate::units::Unit;
use num_bigint::BigUint;

/// `numerator / denominator * 100`, or 0 when there is nothing to divide by.
pub fn ratio_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Exact totals of one quantity over a streak, plus the per-block average in display units.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantitySummary {
    pub unit: Unit,
    pub total: BigUint,
    pub min: BigUint,
    pub max: BigUint,
    /// `total / span` in `unit`; `None` for a streak with a span of 0.
    pub average: Option<f64>,
}

impl QuantitySummary {
    fn new(aggregate: &RunningAggregate, unit: Unit, span: u64) -> Self {
        let average = (span > 0).then(|| unit.to_display(&aggregate.total) / span as f64);
        Self {
            unit,
            total: aggregate.total.clone(),
            min: aggregate.min.clone(),
            max: aggregate.max.clone(),
            average,
        }
    }

    pub fn total_display(&self) -> f64 {
        self.unit.to_display(&self.total)
    }

    pub fn min_display(&self) -> f64 {
        self.unit.to_display(&self.min)
    }

    pub fn max_display(&self) -> f64 {
        self.unit.to_display(&self.max)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreakSummary {
    pub start_block: u64,
    pub end_block: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub span: u64,
    pub total_transactions: u64,
    pub total_type2_transactions: u64,
    /// Share of EIP-1559 transactions, in percent.
    pub type2_ratio: f64,
    pub rewards: QuantitySummary,
    pub burned: QuantitySummary,
    pub tips: QuantitySummary,
    pub base_fee: QuantitySummary,
    pub priority_fee: QuantitySummary,
}

impl From<&StreakState> for StreakSummary {
    fn from(streak: &StreakState) -> Self {
        let span = streak.span();
        Self {
            start_block: streak.start_block,
            end_block: streak.end_block,
            start_timestamp: streak.start_timestamp,
            end_timestamp: streak.end_timestamp,
            span,
            total_transactions: streak.total_transactions,
            total_type2_transactions: streak.total_type2_transactions,
            type2_ratio: ratio_percent(
                streak.total_type2_transactions,
                streak.total_transactions,
            ),
            rewards: QuantitySummary::new(&streak.rewards, Unit::Ether, span),
            burned: QuantitySummary::new(&streak.burned, Unit::Ether, span),
            tips: QuantitySummary::new(&streak.tips, Unit::Ether, span),
            base_fee: QuantitySummary::new(&streak.base_fee, Unit::Gwei, span),
            priority_fee: QuantitySummary::new(&streak.priority_fee, Unit::Gwei, span),
        }
    }
}

/// Final statistics for one threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdSummary {
    pub threshold: Threshold,
    pub total_blocks: u64,
    pub full_block_count: u64,
    pub qualifying_run_count: u64,
    /// Full blocks per processed block, in percent.
    pub percent_full: f64,
    /// Qualifying run events per processed block, in percent. This counts runs, not the blocks
    /// inside them.
    pub qualifying_run_rate: f64,
    pub best_streak: Option<StreakSummary>,
}

impl ThresholdSummary {
    pub fn new(tracker: &ThresholdTracker, total_blocks: u64) -> Self {
        Self {
            threshold: tracker.threshold(),
            total_blocks,
            full_block_count: tracker.full_block_count(),
            qualifying_run_count: tracker.qualifying_run_count(),
            percent_full: ratio_percent(tracker.full_block_count(), total_blocks),
            qualifying_run_rate: ratio_percent(tracker.qualifying_run_count(), total_blocks),
            best_streak: tracker.best_streak().map(StreakSummary::from),
        }
    }
}
