mod snapshot_table;

use crate::report::snapshot_table::SnapshotRow;
use cema_summary_model::{AnalysisReport, Severity};
use std::fmt::Write as _;
use tabled::settings::Style;
use tabled::Table;

const RULE_WIDTH: usize = 50;

/// Print the full textual summary of a run to stdout
pub fn print_summary(report: &AnalysisReport) -> Result<(), std::fmt::Error> {
    println!("{}", render_summary(report)?);
    Ok(())
}

/// Render the textual summary of a run.
///
/// This is the per-snapshot table, the ignition verdict and a closing block with the time range,
/// the extremes and the regime.
pub fn render_summary(report: &AnalysisReport) -> Result<String, std::fmt::Error> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    writeln!(out, "Case directory: {}", report.case_dir.display())?;
    writeln!(out, "{rule}")?;
    writeln!(
        out,
        "Found {} time steps with `{}` data",
        report.snapshots_discovered, report.field_name
    )?;

    let rows = report
        .series
        .iter()
        .map(SnapshotRow::from)
        .collect::<Vec<_>>();
    let mut table = Table::new(&rows);
    table.with(Style::modern());
    writeln!(out, "{table}")?;
    writeln!(out, "{rule}")?;

    match report.verdict.onset {
        Some(onset) => {
            writeln!(out, "Autoignition onset at t = {:.2e} s", onset.time)?;
            writeln!(out, "   onset peak CEM: {:.2e} 1/s", onset.peak)?;
            writeln!(out, "   max CEM:        {:.2e} 1/s", report.verdict.global_max)?;
        }
        None => writeln!(
            out,
            "System is stable, no autoignition detected (all CEM <= 0)"
        )?,
    }

    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "CEMA summary")?;
    writeln!(out, "{rule}")?;
    if let Some((start, end)) = report.series.time_range() {
        writeln!(out, "Time range: {start:.2e} - {end:.2e} s")?;
    }
    writeln!(out, "Max CEM: {:.2e} 1/s", report.verdict.global_max)?;
    if let Some(min) = report.series.global_min() {
        writeln!(out, "Min CEM: {min:.2e} 1/s")?;
    }
    writeln!(out, "{}", regime_line(report.verdict.severity))?;

    if !report.skipped_snapshots.is_empty() {
        writeln!(
            out,
            "Skipped {} time steps with no usable data: {}",
            report.skipped_snapshots.len(),
            report
                .skipped_snapshots
                .iter()
                .map(|t| format!("{t:.2e}"))
                .collect::<Vec<_>>()
                .join(", ")
        )?;
    }
    if report.skipped_lines > 0 {
        writeln!(out, "Skipped {} unreadable data lines", report.skipped_lines)?;
    }

    Ok(out)
}

fn regime_line(severity: Severity) -> String {
    match severity {
        Severity::StrongExplosiveMode => {
            format!("WARNING: {severity} detected (CEM > 10^7)")
        }
        Severity::FastChemicalReaction => {
            format!("NOTICE: {severity} detected (CEM > 10^5)")
        }
        Severity::SlowChemicalReaction => format!("INFO: {severity} detected (CEM > 0)"),
        Severity::ChemicallyStable => format!("SAFE: system is {severity}"),
    }
}
