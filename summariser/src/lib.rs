use cema_summary_model::AnalysisReport;
use log::{info, warn};
use std::path::{Path, PathBuf};

pub mod chart;
pub mod classify;
pub mod diagnose;
pub mod discovery;
pub mod error;
pub mod field;
pub mod reduce;
pub mod report;

pub use error::{AnalysisError, ClassifyError};

/// Name of the CEM field written by the solver into each time directory
pub const DEFAULT_FIELD_NAME: &str = "cem";
/// Default file name for the chart, written to the current directory
pub const DEFAULT_CHART_PATH: &str = "cem_analysis.png";
/// Default file name for the JSON report, written to the current directory
pub const DEFAULT_REPORT_PATH: &str = "cem_analysis.json";

/// Everything an analysis run needs to know about its inputs and outputs
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub case_dir: PathBuf,
    pub field_name: String,
    /// Where to write the chart, `None` to skip it
    pub chart_path: Option<PathBuf>,
    /// Font for the chart text, `None` to search the usual system locations
    pub chart_font: Option<PathBuf>,
    /// Where to write the JSON report, `None` to skip it
    pub report_path: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn new(case_dir: impl Into<PathBuf>) -> Self {
        Self {
            case_dir: case_dir.into(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            chart_path: Some(PathBuf::from(DEFAULT_CHART_PATH)),
            chart_font: None,
            report_path: Some(PathBuf::from(DEFAULT_REPORT_PATH)),
        }
    }
}

/// Discover, read, reduce and classify all snapshots of a case.
///
/// The whole case is loaded before the verdict is computed. No output is written here.
pub fn analyze_case(case_dir: &Path, field_name: &str) -> Result<AnalysisReport, AnalysisError> {
    if !case_dir.is_dir() {
        return Err(AnalysisError::Configuration {
            path: case_dir.to_path_buf(),
        });
    }

    let snapshots = discovery::discover_snapshots(case_dir, field_name)?;
    info!(
        "Found {} time steps with `{field_name}` data in {}",
        snapshots.len(),
        case_dir.display()
    );

    let reduction = reduce::reduce_snapshots(&snapshots, field_name)?;
    let verdict = classify::classify(&reduction.series)?;

    Ok(AnalysisReport {
        case_dir: case_dir.to_path_buf(),
        field_name: field_name.to_string(),
        snapshots_discovered: snapshots.len(),
        skipped_snapshots: reduction.skipped_snapshots,
        skipped_lines: reduction.skipped_lines,
        series: reduction.series,
        verdict,
    })
}

/// Run the analysis and produce every configured output
pub fn run(config: &AnalysisConfig) -> anyhow::Result<AnalysisReport> {
    let report = analyze_case(&config.case_dir, &config.field_name)?;

    report::print_summary(&report)?;

    if let Some(report_path) = &config.report_path {
        cema_summary_model::write_report_file(&report, report_path)?;
        info!("Report written to {}", report_path.display());
    }

    if let Some(chart_path) = &config.chart_path {
        match chart::find_font(config.chart_font.as_deref()) {
            Some(font) => {
                chart::render_chart(&report.series, chart_path, &font)?;
                println!("\nChart saved: {}", chart_path.display());
            }
            None => warn!("No usable font found, skipping the chart. Pass a font file to draw it"),
        }
    }

    Ok(report)
}
