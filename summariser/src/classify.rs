use crate::error::ClassifyError;
use cema_summary_model::{IgnitionOnset, IgnitionVerdict, Severity, TimeSeries};

/// Judge a complete time series.
///
/// Onset is the first snapshot, in time order, whose maximum is strictly positive. Severity is
/// taken from the largest maximum over the whole series, which need not be the onset snapshot.
pub fn classify(series: &TimeSeries) -> Result<IgnitionVerdict, ClassifyError> {
    let global_max = series.global_max().ok_or(ClassifyError::EmptySeries)?;

    let onset = series
        .iter()
        .find(|s| s.max > 0.0)
        .map(|s| IgnitionOnset {
            time: s.time,
            peak: s.max,
        });

    Ok(IgnitionVerdict {
        onset,
        severity: Severity::from_peak(global_max),
        global_max,
    })
}
