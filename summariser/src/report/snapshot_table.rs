use cema_summary_model::SnapshotStatistic;
use tabled::Tabled;

#[derive(Tabled)]
pub struct SnapshotRow {
    #[tabled(rename = "t (s)", display = "sci2")]
    pub time: f64,
    #[tabled(rename = "max (1/s)", display = "sci2")]
    pub max: f64,
    #[tabled(rename = "min (1/s)", display = "sci2")]
    pub min: f64,
    #[tabled(rename = "mean (1/s)", display = "sci2")]
    pub mean: f64,
    #[tabled(rename = "positive (%)", display = "pct1")]
    pub positive_fraction: f64,
}

impl From<&SnapshotStatistic> for SnapshotRow {
    fn from(statistic: &SnapshotStatistic) -> Self {
        Self {
            time: statistic.time,
            max: statistic.max,
            min: statistic.min,
            mean: statistic.mean,
            positive_fraction: statistic.positive_fraction,
        }
    }
}

fn sci2(n: &f64) -> String {
    format!("{:.2e}", n)
}

fn pct1(n: &f64) -> String {
    format!("{:.1}", n)
}
