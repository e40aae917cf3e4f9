use crate::{Error, Result};
use burnstats_core::{
    config::BoundaryMode,
    summary::{QuantitySummary, StreakSummary, ThresholdSummary},
    AnalysisReport,
};
use chrono::DateTime;
use csv::WriterBuilder;
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn render(self, report: &AnalysisReport) -> Result<String> {
        match self {
            ReportFormat::Text => render_text(report),
            ReportFormat::Json => render_json(report),
            ReportFormat::Csv => render_csv(report),
        }
    }
}

/// Formats a unix timestamp as a UTC date, falling back to the raw number if it is out of range.
fn utc_date(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

#[derive(Serialize)]
struct TemplateData {
    date: String,
    latest_block: String,
    total_blocks: u64,
    skipped_records: u64,
    boundary_mode: String,
    min_run_length: u64,
    thresholds: Vec<TextThreshold>,
}

#[derive(Serialize)]
struct TextThreshold {
    threshold: String,
    percent_full: String,
    full_block_count: u64,
    qualifying_run_rate: String,
    qualifying_run_count: u64,
    streak: Option<TextStreak>,
}

#[derive(Serialize)]
struct TextStreak {
    start_block: u64,
    end_block: u64,
    start_date: String,
    end_date: String,
    span: u64,
    type2_ratio: String,
    total_type2_transactions: u64,
    total_transactions: u64,
    quantities: Vec<TextQuantity>,
}

#[derive(Serialize)]
struct TextQuantity {
    name: &'static str,
    unit: String,
    total: String,
    min: String,
    max: String,
    average: String,
}

impl TextQuantity {
    fn new(name: &'static str, quantity: &QuantitySummary) -> Self {
        Self {
            name,
            unit: quantity.unit.to_string(),
            total: two_decimals(quantity.total_display()),
            min: two_decimals(quantity.min_display()),
            max: two_decimals(quantity.max_display()),
            average: quantity
                .average
                .map(|avg| format!("{avg:.2} {}", quantity.unit))
                .unwrap_or_else(|| "n/a".to_owned()),
        }
    }
}

impl From<&StreakSummary> for TextStreak {
    fn from(streak: &StreakSummary) -> Self {
        Self {
            start_block: streak.start_block,
            end_block: streak.end_block,
            start_date: utc_date(streak.start_timestamp),
            end_date: utc_date(streak.end_timestamp),
            span: streak.span,
            type2_ratio: two_decimals(streak.type2_ratio),
            total_type2_transactions: streak.total_type2_transactions,
            total_transactions: streak.total_transactions,
            quantities: vec![
                TextQuantity::new("rewards", &streak.rewards),
                TextQuantity::new("burned", &streak.burned),
                TextQuantity::new("tips", &streak.tips),
                TextQuantity::new("basefee", &streak.base_fee),
                TextQuantity::new("priorityfee", &streak.priority_fee),
            ],
        }
    }
}

impl TemplateData {
    fn new(report: &AnalysisReport, date: String) -> Self {
        Self {
            date,
            latest_block: report
                .latest_block
                .map(|n| n.to_string())
                .unwrap_or_else(|| "none".to_owned()),
            total_blocks: report.total_blocks,
            skipped_records: report.skipped_records,
            boundary_mode: report.boundary_mode.to_string(),
            min_run_length: report.min_run_length,
            thresholds: report
                .summaries
                .iter()
                .map(|summary| TextThreshold {
                    threshold: summary.threshold.to_string(),
                    percent_full: two_decimals(summary.percent_full),
                    full_block_count: summary.full_block_count,
                    qualifying_run_rate: two_decimals(summary.qualifying_run_rate),
                    qualifying_run_count: summary.qualifying_run_count,
                    streak: summary.best_streak.as_ref().map(TextStreak::from),
                })
                .collect(),
        }
    }
}

pub fn render_text(report: &AnalysisReport) -> Result<String> {
    let template = include_str!("template.txt.handlebars");

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data = HashMap::new();
    data.insert(
        "data",
        TemplateData::new(report, chrono::Local::now().to_rfc2822()),
    );
    Ok(handlebars.render_template(template, &data)?)
}

/// Exact wei amounts are kept as decimal strings next to their display value.
#[derive(Serialize)]
struct JsonQuantity {
    unit: String,
    total_wei: String,
    min_wei: String,
    max_wei: String,
    total: f64,
    average: Option<f64>,
}

impl From<&QuantitySummary> for JsonQuantity {
    fn from(quantity: &QuantitySummary) -> Self {
        Self {
            unit: quantity.unit.to_string(),
            total_wei: quantity.total.to_string(),
            min_wei: quantity.min.to_string(),
            max_wei: quantity.max.to_string(),
            total: quantity.total_display(),
            average: quantity.average,
        }
    }
}

#[derive(Serialize)]
struct JsonStreak {
    start_block: u64,
    end_block: u64,
    start_timestamp: u64,
    end_timestamp: u64,
    span: u64,
    total_transactions: u64,
    total_type2_transactions: u64,
    type2_ratio: f64,
    rewards: JsonQuantity,
    burned: JsonQuantity,
    tips: JsonQuantity,
    base_fee: JsonQuantity,
    priority_fee: JsonQuantity,
}

impl From<&StreakSummary> for JsonStreak {
    fn from(streak: &StreakSummary) -> Self {
        Self {
            start_block: streak.start_block,
            end_block: streak.end_block,
            start_timestamp: streak.start_timestamp,
            end_timestamp: streak.end_timestamp,
            span: streak.span,
            total_transactions: streak.total_transactions,
            total_type2_transactions: streak.total_type2_transactions,
            type2_ratio: streak.type2_ratio,
            rewards: (&streak.rewards).into(),
            burned: (&streak.burned).into(),
            tips: (&streak.tips).into(),
            base_fee: (&streak.base_fee).into(),
            priority_fee: (&streak.priority_fee).into(),
        }
    }
}

#[derive(Serialize)]
struct JsonThreshold {
    threshold: u8,
    full_block_count: u64,
    qualifying_run_count: u64,
    percent_full: f64,
    qualifying_run_rate: f64,
    best_streak: Option<JsonStreak>,
}

#[derive(Serialize)]
struct JsonReport {
    latest_block: Option<u64>,
    total_blocks: u64,
    skipped_records: u64,
    min_run_length: u64,
    boundary_mode: BoundaryMode,
    thresholds: Vec<JsonThreshold>,
}

pub fn render_json(report: &AnalysisReport) -> Result<String> {
    let json = JsonReport {
        latest_block: report.latest_block,
        total_blocks: report.total_blocks,
        skipped_records: report.skipped_records,
        min_run_length: report.min_run_length,
        boundary_mode: report.boundary_mode,
        thresholds: report
            .summaries
            .iter()
            .map(|summary| JsonThreshold {
                threshold: summary.threshold.percent(),
                full_block_count: summary.full_block_count,
                qualifying_run_count: summary.qualifying_run_count,
                percent_full: summary.percent_full,
                qualifying_run_rate: summary.qualifying_run_rate,
                best_streak: summary.best_streak.as_ref().map(JsonStreak::from),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

#[derive(Serialize)]
struct CsvRow {
    threshold: u8,
    total_blocks: u64,
    full_block_count: u64,
    percent_full: f64,
    qualifying_run_count: u64,
    qualifying_run_rate: f64,
    streak_start_block: Option<u64>,
    streak_end_block: Option<u64>,
    streak_span: Option<u64>,
    streak_type2_ratio: Option<f64>,
    streak_rewards_eth: Option<f64>,
    streak_burned_eth: Option<f64>,
    streak_tips_eth: Option<f64>,
    streak_avg_base_fee_gwei: Option<f64>,
    streak_avg_priority_fee_gwei: Option<f64>,
}

impl From<&ThresholdSummary> for CsvRow {
    fn from(summary: &ThresholdSummary) -> Self {
        let streak = summary.best_streak.as_ref();
        Self {
            threshold: summary.threshold.percent(),
            total_blocks: summary.total_blocks,
            full_block_count: summary.full_block_count,
            percent_full: summary.percent_full,
            qualifying_run_count: summary.qualifying_run_count,
            qualifying_run_rate: summary.qualifying_run_rate,
            streak_start_block: streak.map(|s| s.start_block),
            streak_end_block: streak.map(|s| s.end_block),
            streak_span: streak.map(|s| s.span),
            streak_type2_ratio: streak.map(|s| s.type2_ratio),
            streak_rewards_eth: streak.map(|s| s.rewards.total_display()),
            streak_burned_eth: streak.map(|s| s.burned.total_display()),
            streak_tips_eth: streak.map(|s| s.tips.total_display()),
            streak_avg_base_fee_gwei: streak.and_then(|s| s.base_fee.average),
            streak_avg_priority_fee_gwei: streak.and_then(|s| s.priority_fee.average),
        }
    }
}

/// One row per threshold.
pub fn render_csv(report: &AnalysisReport) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(vec![]);
    for summary in &report.summaries {
        writer.serialize(CsvRow::from(summary))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
