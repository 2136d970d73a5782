use crate::error::AnalysisError;
use cema_summary_model::Snapshot;
use itertools::Itertools;
use log::debug;
use std::path::Path;

/// Find the time directories under `case_dir` that contain `field_name`, in ascending time order.
///
/// Entries whose name is not a non-negative number, plain files, and time directories without
/// the field are ignored. Finding nothing at all is an [AnalysisError::NoData].
pub fn discover_snapshots(case_dir: &Path, field_name: &str) -> Result<Vec<Snapshot>, AnalysisError> {
    let mut snapshots = Vec::new();

    for entry in std::fs::read_dir(case_dir).map_err(AnalysisError::io(case_dir))? {
        let entry = entry.map_err(AnalysisError::io(case_dir))?;
        let path = entry.path();

        let Some(time) = entry.file_name().to_str().and_then(parse_time) else {
            debug!("Ignoring non-time entry {}", path.display());
            continue;
        };

        if !path.is_dir() {
            debug!("Ignoring {}, not a directory", path.display());
            continue;
        }

        let snapshot = Snapshot::new(time, path);
        if !snapshot.field_path(field_name).is_file() {
            debug!(
                "Ignoring time directory {}, no `{field_name}` field",
                snapshot.path.display()
            );
            continue;
        }

        snapshots.push(snapshot);
    }

    if snapshots.is_empty() {
        return Err(AnalysisError::NoData {
            case_dir: case_dir.to_path_buf(),
            field: field_name.to_string(),
        });
    }

    // `read_dir` order is platform dependent, the path breaks ties such as `1` and `1.0`
    let snapshots = snapshots
        .into_iter()
        .sorted_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.path.cmp(&b.path)))
        .collect::<Vec<_>>();

    debug!(
        "Found {} snapshots with a `{field_name}` field in {}",
        snapshots.len(),
        case_dir.display()
    );

    Ok(snapshots)
}

/// Parse a directory name as a simulation time
fn parse_time(name: &str) -> Option<f64> {
    name.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
}
