use crate::config::{AnalysisConfig, BoundaryMode, DecodeErrorPolicy};
use crate::db::{DbError, DbOps};
use crate::engine::AggregationEngine;
use crate::record::RawBlockStats;
use crate::summary::ThresholdSummary;
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Everything a report needs about one analysis run.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisReport {
    /// Highest block number in the dataset, `None` for an empty dataset.
    pub latest_block: Option<u64>,
    pub total_blocks: u64,
    pub skipped_records: u64,
    pub min_run_length: u64,
    pub boundary_mode: BoundaryMode,
    pub summaries: Vec<ThresholdSummary>,
}

/// Feeds stored rows to an [`AggregationEngine`], applying the configured decode policy.
pub struct Analysis {
    engine: AggregationEngine,
    on_decode_error: DecodeErrorPolicy,
    min_run_length: u64,
    boundary_mode: BoundaryMode,
    latest_block: Option<u64>,
    skipped_records: u64,
}

impl Analysis {
    pub fn new(latest_block: Option<u64>, config: &AnalysisConfig) -> Self {
        Self {
            engine: AggregationEngine::from_config(latest_block.unwrap_or_default(), config),
            on_decode_error: config.on_decode_error,
            min_run_length: config.min_run_length,
            boundary_mode: config.boundary_mode,
            latest_block,
            skipped_records: 0,
        }
    }

    pub fn ingest(&mut self, row: &RawBlockStats) -> Result<()> {
        match self.engine.process_raw(row) {
            Ok(()) => Ok(()),
            Err(err) => match self.on_decode_error {
                DecodeErrorPolicy::Abort => Err(err.into()),
                DecodeErrorPolicy::Skip => {
                    warn!(
                        block = row.number,
                        field = %err.field,
                        "skipping block that failed to decode: {}",
                        err.kind
                    );
                    self.skipped_records += 1;
                    Ok(())
                }
            },
        }
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub fn finish(mut self) -> AnalysisReport {
        self.engine.flush();
        AnalysisReport {
            latest_block: self.latest_block,
            total_blocks: self.engine.total_blocks_processed(),
            skipped_records: self.skipped_records,
            min_run_length: self.min_run_length,
            boundary_mode: self.boundary_mode,
            summaries: self.engine.summaries(),
        }
    }
}

/// Runs the full-block analysis over every row in `db`, in block order.
pub fn analyze(db: &impl DbOps, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let latest_block = db.latest_block_number().map_err(db_error)?;
    let mut analysis = Analysis::new(latest_block, config);
    let Some(latest) = latest_block else {
        info!("No blocks found in the database.");
        return Ok(analysis.finish());
    };

    let num_rows = db.num_block_stats().map_err(db_error)?;
    info!(
        "Analyzing {num_rows} blocks (latest block {latest}) at thresholds {}",
        config
            .thresholds
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut after = None;
    loop {
        let page = db
            .get_block_stats(after, config.page_size)
            .map_err(db_error)?;
        let Some(last) = page.last() else {
            break;
        };
        after = Some(last.number);

        for row in &page {
            analysis.ingest(row)?;
        }
        debug!(
            through_block = last.number,
            processed = analysis.engine().total_blocks_processed(),
            "processed page"
        );

        if (page.len() as u64) < config.page_size {
            break;
        }
    }

    let report = analysis.finish();
    info!(
        processed = report.total_blocks,
        skipped = report.skipped_records,
        "analysis complete"
    );
    Ok(report)
}

fn db_error(err: impl Into<DbError>) -> Error {
    Error::Db(err.into())
}
