use crate::error::AnalysisError;
use crate::field::parse_field_file;
use cema_summary_model::{Snapshot, SnapshotStatistic, TimeSeries};
use log::{debug, warn};
use polars::prelude::*;

const CEM_COLUMN: &str = "cem";
const POSITIVE_COLUMN: &str = "positive";

/// A time series together with what was dropped while building it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reduction {
    pub series: TimeSeries,
    /// Times of snapshots whose field held no usable values
    pub skipped_snapshots: Vec<f64>,
    /// Unreadable data lines, summed over all snapshots
    pub skipped_lines: usize,
}

/// Read `field_name` from every snapshot and reduce each one to a [SnapshotStatistic].
///
/// Snapshots are processed in the order given. A snapshot with no usable values does not
/// contribute to the series and is recorded in [Reduction::skipped_snapshots] instead.
pub fn reduce_snapshots(
    snapshots: &[Snapshot],
    field_name: &str,
) -> Result<Reduction, AnalysisError> {
    let mut reduction = Reduction::default();

    for snapshot in snapshots {
        let field_path = snapshot.field_path(field_name);
        let parsed = parse_field_file(&field_path)?;
        reduction.skipped_lines += parsed.skipped_lines;

        if parsed.is_empty() {
            warn!(
                "No usable `{field_name}` values at t = {:e}, skipping {}",
                snapshot.time,
                field_path.display()
            );
            reduction.skipped_snapshots.push(snapshot.time);
            continue;
        }

        let statistic = snapshot_statistic(snapshot.time, &parsed.values)?;
        debug!(
            "t = {:e}: {} values, max = {:e}, min = {:e}, mean = {:e}, positive = {:.1}%",
            statistic.time,
            parsed.values.len(),
            statistic.max,
            statistic.min,
            statistic.mean,
            statistic.positive_fraction
        );
        reduction.series.push(statistic);
    }

    Ok(reduction)
}

/// Summary statistics of a non-empty field sample
pub(crate) fn snapshot_statistic(
    time: f64,
    values: &[f64],
) -> Result<SnapshotStatistic, AnalysisError> {
    let frame = df!(CEM_COLUMN => values)?;
    let cem = frame.column(CEM_COLUMN)?.as_materialized_series();

    let max = cem
        .max::<f64>()?
        .ok_or(AnalysisError::MissingStatistic { what: "max" })?;
    let min = cem
        .min::<f64>()?
        .ok_or(AnalysisError::MissingStatistic { what: "min" })?;
    // Summation can drift past the extremes when all values are nearly equal
    let mean = cem
        .mean()
        .ok_or(AnalysisError::MissingStatistic { what: "mean" })?
        .clamp(min, max);
    let count = cem.len();

    let out = frame
        .lazy()
        .select([col(CEM_COLUMN).gt(lit(0.0)).alias(POSITIVE_COLUMN)])
        .collect()?;
    let positive = out.column(POSITIVE_COLUMN)?.as_materialized_series().sum::<usize>()?;

    Ok(SnapshotStatistic {
        time,
        max,
        min,
        mean,
        positive_fraction: positive_pct(positive, count),
    })
}

#[inline]
fn positive_pct(positive: usize, count: usize) -> f64 {
    (100.0 * positive as f64 / count as f64).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_snapshot(root: &Path, name: &str, time: f64, body: &str) -> anyhow::Result<Snapshot> {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("cem"), body)?;
        Ok(Snapshot::new(time, dir))
    }

    #[test]
    fn statistic_of_mixed_sample() -> anyhow::Result<()> {
        let statistic = snapshot_statistic(0.5, &[-2.0, 4.0, 0.0, 6.0])?;
        assert_eq!(statistic.time, 0.5);
        assert_eq!(statistic.max, 6.0);
        assert_eq!(statistic.min, -2.0);
        assert_eq!(statistic.mean, 2.0);
        assert_eq!(statistic.positive_fraction, 50.0);
        Ok(())
    }

    #[test]
    fn zero_is_not_positive() -> anyhow::Result<()> {
        let statistic = snapshot_statistic(0.0, &[0.0, 0.0, -1.0])?;
        assert_eq!(statistic.positive_fraction, 0.0);
        assert_eq!(statistic.max, 0.0);
        Ok(())
    }

    #[test]
    fn mean_stays_within_extremes() -> anyhow::Result<()> {
        let values = vec![0.1; 1000];
        let statistic = snapshot_statistic(0.0, &values)?;
        assert!(statistic.min <= statistic.mean);
        assert!(statistic.mean <= statistic.max);
        assert_eq!(statistic.positive_fraction, 100.0);
        Ok(())
    }

    #[test]
    fn empty_snapshots_are_skipped_not_zeroed() -> anyhow::Result<()> {
        let case = tempfile::tempdir()?;
        let snapshots = vec![
            write_snapshot(case.path(), "0", 0.0, "(\n-1;\n-3;\n)\n")?,
            write_snapshot(case.path(), "0.1", 0.1, "(\nbad\n)\n")?,
            write_snapshot(case.path(), "0.2", 0.2, "(\n2;\nx\n-2;\n)\n")?,
        ];

        let reduction = reduce_snapshots(&snapshots, "cem")?;
        assert_eq!(reduction.series.len(), 2);
        assert_eq!(reduction.series.times(), vec![0.0, 0.2]);
        assert_eq!(reduction.skipped_snapshots, vec![0.1]);
        assert_eq!(reduction.skipped_lines, 2);

        let last = reduction.series.entries()[1];
        assert_eq!(last.mean, 0.0);
        assert_eq!(last.positive_fraction, 50.0);
        Ok(())
    }

    #[test]
    fn unreadable_snapshot_is_fatal() -> anyhow::Result<()> {
        let case = tempfile::tempdir()?;
        let snapshots = vec![Snapshot::new(0.0, case.path().join("missing"))];

        let result = reduce_snapshots(&snapshots, "cem");
        assert!(matches!(result, Err(AnalysisError::Io { .. })));
        Ok(())
    }
}
