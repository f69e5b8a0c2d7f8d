// neo4jbackuptool/src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    #[error("Backup command failed: {0}")]
    BackupExecution(String),

    #[error("No backup artifact recognised in tool output: {0}")]
    ArtifactParsing(String),

    #[error("Packaging failed: {0}")]
    Packaging(String),

    #[error("Consistency check failed: {0}")]
    ConsistencyCheck(String),

    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    // Reported after uploads have already succeeded; never fails the job.
    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
