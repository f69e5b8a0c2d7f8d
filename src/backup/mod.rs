pub(crate) mod admin_backup; // Backup tool invocation and flag building
pub(crate) mod archive;      // Tarball creation for artifacts and reports
pub(crate) mod consistency;  // Optional post-backup consistency check
mod logic;
pub(crate) mod tool_output;  // Artifact-name extraction from tool output

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::errors::Result;

/// One database backup as produced on disk by the admin tool.
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub database: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

impl BackupArtifact {
    /// Artifact directory name as reported by the backup tool.
    pub fn artifact_name(&self) -> &str {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.database)
    }
}

/// A compressed archive ready for upload.
#[derive(Debug, Clone)]
pub struct PackagedArtifact {
    pub file_name: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

/// Where the consistency check wrote its report for one artifact.
#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    pub artifact_name: String,
    pub report_path: PathBuf,
}

/// Public entry point for the backup job.
pub async fn run_backup_flow(app_config: &AppConfig) -> Result<()> {
    logic::perform_backup_orchestration(app_config).await
}
