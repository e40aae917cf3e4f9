use crate::commands::{db::open_block_stats_db, Result};
use burnstats_core::{
    config::{BoundaryMode, DecodeErrorPolicy},
    AnalysisConfig, Threshold,
};
use burnstats_report::ReportFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct AnalyzeCliArgs {
    /// TOML file with analysis settings. Flags given on the command line take precedence.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Utilization percentage a block must exceed to count as full. May be repeated.
    #[arg(long = "threshold", short = 't', value_delimiter = ',')]
    pub thresholds: Vec<Threshold>,

    /// A run needs more than this many consecutive full blocks to qualify.
    #[arg(long)]
    pub min_run_length: Option<u64>,

    /// End streaks at the last full block instead of the block that broke the run.
    #[arg(long)]
    pub exclusive: bool,

    /// Skip rows that fail to decode instead of aborting.
    #[arg(long)]
    pub skip_invalid: bool,

    /// Number of rows read from the database per query.
    #[arg(long)]
    pub page_size: Option<u64>,

    #[arg(long, short = 'f', default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub out_file: Option<PathBuf>,
}

impl AnalyzeCliArgs {
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if !self.thresholds.is_empty() {
            config.thresholds = self.thresholds.clone();
        }
        if let Some(min_run_length) = self.min_run_length {
            config.min_run_length = min_run_length;
        }
        if self.exclusive {
            config.boundary_mode = BoundaryMode::Exclusive;
        }
        if self.skip_invalid {
            config.on_decode_error = DecodeErrorPolicy::Skip;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }

        config.validate()?;
        Ok(config)
    }
}

pub fn analyze(db_path: &str, args: &AnalyzeCliArgs) -> Result<()> {
    let config = args.analysis_config()?;

    let db = open_block_stats_db(db_path)?;
    burnstats_report::report(&db, &config, args.format, args.out_file.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{BurnstatsCli, BurnstatsSubcommand};
    use crate::error::BurnstatsError;
    use burnstats_core::{db::DbOps, test_utils::blocks_with_utilization, RawBlockStats};
    use burnstats_sqlite::SqliteDb;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn parse_analyze(argv: &[&str]) -> (String, AnalyzeCliArgs) {
        let cli = BurnstatsCli::try_parse_from(argv).unwrap();
        match cli.command {
            BurnstatsSubcommand::Analyze { args } => (cli.db, args),
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    fn t(percent: u8) -> Threshold {
        Threshold::new(percent).unwrap()
    }

    #[test]
    fn flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("burnstats.toml");
        fs::write(&config_path, "thresholds = [80]\npage_size = 2\nmin_run_length = 5\n").unwrap();

        let (_, args) = parse_analyze(&[
            "burnstats",
            "analyze",
            "--config",
            config_path.to_str().unwrap(),
            "-t",
            "97",
            "--exclusive",
            "--skip-invalid",
        ]);
        let config = args.analysis_config().unwrap();

        assert_eq!(config.thresholds, vec![t(97)]);
        assert_eq!(config.page_size, 2);
        assert_eq!(config.min_run_length, 5);
        assert_eq!(config.boundary_mode, BoundaryMode::Exclusive);
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Skip);
    }

    #[test]
    fn parses_threshold_lists() {
        let (db, args) = parse_analyze(&["burnstats", "analyze", "-t", "90,95%", "-t", "99"]);
        assert_eq!(db, "burnstats.db");
        assert_eq!(args.thresholds, vec![t(90), t(95), t(99)]);
        assert_eq!(args.format, ReportFormat::Text);

        assert!(BurnstatsCli::try_parse_from(["burnstats", "analyze", "-t", "101"]).is_err());
        assert!(BurnstatsCli::try_parse_from(["burnstats", "analyze", "-f", "html"]).is_err());
    }

    #[test]
    fn rejects_zero_page_size() {
        let (_, args) = parse_analyze(&["burnstats", "analyze", "--page-size", "0"]);
        assert!(matches!(
            args.analysis_config(),
            Err(BurnstatsError::Config(_))
        ));
    }

    #[test]
    fn missing_db_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nope.db");
        let (_, args) = parse_analyze(&["burnstats", "analyze"]);

        let err = analyze(db_path.to_str().unwrap(), &args).unwrap_err();
        assert!(matches!(err, BurnstatsError::DbDoesNotExist(_)));
        assert!(!db_path.exists());
    }

    #[test]
    fn database_without_block_stats_is_left_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        let db_path = db_path.to_str().unwrap();
        let db = SqliteDb::from_file(db_path).unwrap();
        let (_, args) = parse_analyze(&["burnstats", "analyze"]);

        let err = analyze(db_path, &args).unwrap_err();
        assert!(matches!(err, BurnstatsError::NoBlockStatsTable(_)));
        assert!(!db.table_exists("block_stats").unwrap());
        assert_eq!(db.version(), 0);
    }

    #[test]
    fn writes_json_report() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("blocks.db");
        let db_path = db_path.to_str().unwrap();
        let out_path = temp_dir.path().join("reports/report.json");

        let db = SqliteDb::from_file(db_path).unwrap();
        db.create_tables().unwrap();
        let rows = blocks_with_utilization(100, &[96, 97, 98, 99, 40, 95])
            .iter()
            .map(RawBlockStats::from)
            .collect::<Vec<_>>();
        db.insert_block_stats(&rows).unwrap();

        let (_, args) = parse_analyze(&[
            "burnstats",
            "analyze",
            "-t",
            "95",
            "-f",
            "json",
            "-o",
            out_path.to_str().unwrap(),
        ]);
        analyze(db_path, &args).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(report["latest_block"], 105);
        assert_eq!(report["total_blocks"], 6);
        let at_95 = &report["thresholds"][0];
        assert_eq!(at_95["threshold"], 95);
        assert_eq!(at_95["full_block_count"], 4);
        assert_eq!(at_95["best_streak"]["start_block"], 100);
        assert_eq!(at_95["best_streak"]["end_block"], 104);
    }
}
