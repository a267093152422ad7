use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    #[error("catalog unavailable: {0}")]
    #[diagnostic(help("check the catalog URL and network access; no dataset was processed"))]
    CatalogUnavailable(String),

    #[error("no download URL in distribution list of {0}")]
    NoDownloadUrl(String),

    #[error("dataset identifier is not a plain file name: {0:?}")]
    InvalidIdentifier(String),

    #[error("content request failed: {0}")]
    Fetch(String),

    #[error("content endpoint returned status {status}: {message}")]
    FetchStatus { status: u16, message: String },

    #[error("failed to parse delimited text: {0}")]
    Parse(String),

    #[error("failed to write dataset output: {0}")]
    Persist(String),

    #[error("failed to read watermark file at {path}: {message}")]
    WatermarkRead { path: PathBuf, message: String },

    #[error("failed to save watermark file at {path}: {message}")]
    #[diagnostic(help("the next run will download every dataset again"))]
    WatermarkPersist { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl SyncError {
    /// Run-level errors abort the sync; everything else is scoped to one dataset.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SyncError::NoDownloadUrl(_)
                | SyncError::InvalidIdentifier(_)
                | SyncError::Fetch(_)
                | SyncError::FetchStatus { .. }
                | SyncError::Parse(_)
                | SyncError::Persist(_)
        )
    }
}
