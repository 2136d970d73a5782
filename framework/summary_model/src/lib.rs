use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A single simulation time instant found in a case directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// The simulation time, parsed from the directory name
    pub time: f64,
    /// The time directory that holds the field files for this instant
    pub path: PathBuf,
}

impl Snapshot {
    pub fn new(time: f64, path: PathBuf) -> Self {
        Self { time, path }
    }

    /// The location of the named field file inside this snapshot
    pub fn field_path(&self, field_name: &str) -> PathBuf {
        self.path.join(field_name)
    }
}

/// Summary statistics of one snapshot's field values
///
/// Derived from exactly one non-empty field sample, so `min <= mean <= max` and
/// `positive_fraction` is a percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SnapshotStatistic {
    pub time: f64,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Percentage of cells with a strictly positive value
    pub positive_fraction: f64,
}

/// Per-snapshot statistics in ascending time order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TimeSeries {
    entries: Vec<SnapshotStatistic>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statistic. Callers feed snapshots in ascending time order.
    pub fn push(&mut self, statistic: SnapshotStatistic) {
        self.entries.push(statistic);
    }

    pub fn entries(&self) -> &[SnapshotStatistic] {
        &self.entries
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SnapshotStatistic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(|s| s.time).collect()
    }

    /// The largest `max` across all snapshots
    pub fn global_max(&self) -> Option<f64> {
        self.entries.iter().map(|s| s.max).max_by(f64::total_cmp)
    }

    /// The smallest `min` across all snapshots
    pub fn global_min(&self) -> Option<f64> {
        self.entries.iter().map(|s| s.min).min_by(f64::total_cmp)
    }

    /// First and last simulation time covered by the series
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match self.entries.iter().map(|s| s.time).minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(t) => Some((t, t)),
            MinMaxResult::MinMax(start, end) => Some((start, end)),
        }
    }
}

impl FromIterator<SnapshotStatistic> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = SnapshotStatistic>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Coarse chemical regime, judged from the largest CEM value seen in a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Global maximum above 1e7 1/s
    StrongExplosiveMode,
    /// Global maximum above 1e5 1/s
    FastChemicalReaction,
    /// Global maximum above zero
    SlowChemicalReaction,
    /// No positive CEM value anywhere
    ChemicallyStable,
}

impl Severity {
    pub const STRONG_THRESHOLD: f64 = 1e7;
    pub const FAST_THRESHOLD: f64 = 1e5;

    /// Classify a peak CEM value, checking the bands from the top down
    pub fn from_peak(peak: f64) -> Self {
        if peak > Self::STRONG_THRESHOLD {
            Severity::StrongExplosiveMode
        } else if peak > Self::FAST_THRESHOLD {
            Severity::FastChemicalReaction
        } else if peak > 0.0 {
            Severity::SlowChemicalReaction
        } else {
            Severity::ChemicallyStable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::StrongExplosiveMode => "strong explosive mode",
            Severity::FastChemicalReaction => "fast chemical reaction",
            Severity::SlowChemicalReaction => "slow chemical reaction",
            Severity::ChemicallyStable => "chemically stable",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The first snapshot in which any cell became explosive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IgnitionOnset {
    pub time: f64,
    /// The maximum CEM value of the onset snapshot
    pub peak: f64,
}

/// Outcome of classifying a complete time series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IgnitionVerdict {
    /// `None` when no snapshot ever had a positive maximum
    pub onset: Option<IgnitionOnset>,
    pub severity: Severity,
    /// The largest `max` across the whole series, which decides [IgnitionVerdict::severity]
    pub global_max: f64,
}

impl IgnitionVerdict {
    pub fn ignited(&self) -> bool {
        self.onset.is_some()
    }
}

/// Everything a single analysis run produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    /// The case directory that was analysed
    pub case_dir: PathBuf,
    /// The field that was read from each time directory
    pub field_name: String,
    /// Number of time directories that contained the field
    pub snapshots_discovered: usize,
    /// Times of snapshots whose field held no usable values
    ///
    /// These snapshots do not appear in [AnalysisReport::series].
    pub skipped_snapshots: Vec<f64>,
    /// Data lines that could not be read as a number, summed over all snapshots
    pub skipped_lines: usize,
    pub series: TimeSeries,
    pub verdict: IgnitionVerdict,
}

/// Serialize the report to a writer as pretty JSON
pub fn store_report<W: Write>(report: &AnalysisReport, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Load a report from a reader
pub fn load_report<R: Read>(reader: R) -> anyhow::Result<AnalysisReport> {
    let reader = std::io::BufReader::new(reader);
    let report: AnalysisReport = serde_json::from_reader(reader)?;
    Ok(report)
}

/// Write the report to a file, replacing any earlier report at that path
pub fn write_report_file(report: &AnalysisReport, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    store_report(report, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Load a report previously written by [write_report_file]
pub fn load_report_file(path: &Path) -> anyhow::Result<AnalysisReport> {
    let file = std::fs::File::open(path)?;
    load_report(file)
}
