use anyhow::Context;
use cema_summariser::{AnalysisConfig, DEFAULT_CHART_PATH, DEFAULT_FIELD_NAME, DEFAULT_REPORT_PATH};
use clap::Parser;
use log::debug;
use std::path::PathBuf;

/// Summarise the chemical explosive mode (CEM) field of a CEMAFoam case over time
#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// The case directory holding the time directories
    #[arg(default_value = ".")]
    case_dir: PathBuf,

    /// Name of the field file read from each time directory
    #[arg(long, env = "CEMA_FIELD", default_value = DEFAULT_FIELD_NAME)]
    field: String,

    /// Where to save the chart
    #[arg(long, env = "CEMA_CHART_PATH", default_value = DEFAULT_CHART_PATH)]
    chart: PathBuf,

    /// TrueType font for the chart text. The usual system fonts are tried when not set.
    #[arg(long, env = "CEMA_CHART_FONT")]
    font: Option<PathBuf>,

    /// Where to save the JSON report
    #[arg(long, env = "CEMA_REPORT_PATH", default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,

    /// Do not draw the chart
    #[arg(long, default_value = "false")]
    no_chart: bool,

    /// Do not write the JSON report
    #[arg(long, default_value = "false")]
    no_report: bool,
}

impl From<Cli> for AnalysisConfig {
    fn from(cli: Cli) -> Self {
        AnalysisConfig {
            case_dir: cli.case_dir,
            field_name: cli.field,
            chart_path: (!cli.no_chart).then_some(cli.chart),
            chart_font: cli.font,
            report_path: (!cli.no_report).then_some(cli.report),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AnalysisConfig::from(Cli::parse());
    debug!("Running with {config:?}");

    cema_summariser::run(&config)
        .with_context(|| format!("CEM analysis of {} failed", config.case_dir.display()))?;

    Ok(())
}
