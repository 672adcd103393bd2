//! Error types shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

use crate::filename::FilenameError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Filename(#[from] FilenameError),

    #[error("catalogue CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code:?}: {stderr}")]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("destination directory does not exist: {0}")]
    MissingDestination(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported calendar '{0}'")]
    UnsupportedCalendar(String),

    #[error("invalid date {year:04}-{month:02}: {reason}")]
    InvalidMonth {
        year: i32,
        month: u32,
        reason: String,
    },

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("NetCDF support not enabled; rebuild with `--features netcdf` or use the cdo backend")]
    FeatureDisabled,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
