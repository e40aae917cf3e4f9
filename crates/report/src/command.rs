use crate::render::ReportFormat;
use crate::Result;
use burnstats_core::{analyze, db::DbOps, AnalysisConfig, AnalysisReport};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Analyzes every block in `db` and writes the report to `out`, or to stdout when `out` is `None`.
pub fn report(
    db: &impl DbOps,
    config: &AnalysisConfig,
    format: ReportFormat,
    out: Option<&Path>,
) -> Result<AnalysisReport> {
    let report = analyze(db, config)?;
    let rendered = format.render(&report)?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, rendered)?;
            info!("saved {format} report to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(report)
}
