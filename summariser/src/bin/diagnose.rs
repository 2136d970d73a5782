use cema_summariser::diagnose::{diagnose, render_diagnostics, write_diagnostics_file};
use clap::Parser;
use std::path::PathBuf;

/// Check a case's reaction mechanism, thermo file and pyJac headers for consistency
#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// The case directory, relative paths below are resolved against it
    #[arg(long, default_value = ".")]
    case: PathBuf,

    /// The reaction mechanism file
    #[arg(long, default_value = "constant/reactionsGRIPyjac")]
    reactions: PathBuf,

    /// The thermophysical properties file
    #[arg(long, default_value = "constant/thermo.compressibleGasGRI")]
    thermo: PathBuf,

    /// The directory holding the generated pyJac headers
    #[arg(long, env = "PYJAC_INCLUDE_DIR")]
    pyjac_dir: Option<PathBuf>,

    /// Also write the findings as JSON to this path
    #[arg(long, env = "CEMA_DIAGNOSTICS_PATH")]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let reactions = cli.case.join(&cli.reactions);
    let thermo = cli.case.join(&cli.thermo);
    let pyjac_dir = cli.pyjac_dir.map(|dir| cli.case.join(dir));
    log::debug!(
        "Checking {}, {} and {:?}",
        reactions.display(),
        thermo.display(),
        pyjac_dir
    );

    let report = diagnose(&reactions, &thermo, pyjac_dir.as_deref())?;
    println!("{}", render_diagnostics(&report)?);

    if let Some(json) = &cli.json {
        write_diagnostics_file(&report, json)?;
        log::info!("Diagnostics written to {}", json.display());
    }

    Ok(())
}
