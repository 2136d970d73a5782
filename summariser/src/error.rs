use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Case directory does not exist or is not a directory: {}", path.display())]
    Configuration { path: PathBuf },

    #[error(
        "No `{field}` field data found under {}. Make sure you are in the right case \
         directory and that the case has been run with the `{field}` field written out",
        case_dir.display()
    )]
    NoData { case_dir: PathBuf, field: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Statistics for {what} could not be computed")]
    MissingStatistic { what: &'static str },

    #[error(transparent)]
    Frame(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| AnalysisError::Io { path, source }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Cannot classify an empty time series")]
    EmptySeries,
}
