// neo4jbackuptool/src/backup/logic.rs
use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::backup::{admin_backup, archive, consistency, BackupArtifact, PackagedArtifact};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::storage;
use crate::utils::setting::check_backup_endpoint;

/// Runs the whole pipeline in order: connectivity probe, backup, packaging,
/// optional consistency checks, destination check, uploads, local cleanup.
///
/// Every step up to and including the uploads is fatal on failure; the job
/// never retries and never continues past a failed artifact. Cleanup runs
/// only once every archive is durably stored, and its failures are
/// reported without changing the exit code.
pub async fn perform_backup_orchestration(config: &AppConfig) -> Result<()> {
    println!(
        "🚀 Starting backup job for pattern '{}'",
        config.request.database_pattern
    );

    if !check_backup_endpoint(&config.request.source_address).await {
        return Err(AppError::Connectivity(format!(
            "backup endpoint {} is not reachable",
            config.request.source_address
        )));
    }

    fs::create_dir_all(&config.backup_dir).with_context(|| {
        format!(
            "Failed to create backup directory {}",
            config.backup_dir.display()
        )
    })?;

    let artifacts = admin_backup::perform_backup(&config.request, &config.backup_dir)?;
    println!(
        "✅ Backup completed with {} artifact(s): {:?}",
        artifacts.len(),
        artifacts.iter().map(|a| a.artifact_name()).collect::<Vec<_>>()
    );

    let mut packaged = Vec::new();
    for artifact in &artifacts {
        packaged.push(archive::package_artifact(artifact, &config.backup_dir)?);
    }

    let mut report_dirs = Vec::new();
    if config.consistency_check.enabled {
        for artifact in &artifacts {
            let report = consistency::check_consistency(
                &config.consistency_check,
                artifact.artifact_name(),
                &artifact.database,
                &config.backup_dir,
            )?;
            report_dirs.push(report.report_path.clone());
            packaged.push(archive::package_report(&report, &config.backup_dir)?);
        }
    }

    let backend = storage::create_backend(&config.cloud_target);
    println!(
        "Using {} destination '{}'",
        backend.name(),
        config.cloud_target.destination
    );
    backend.check_access(&config.cloud_target.destination).await?;

    for item in &packaged {
        backend
            .upload_file(
                &item.file_name,
                &config.backup_dir,
                &config.cloud_target.destination,
            )
            .await?;
    }
    println!(
        "✅ All {} archive(s) uploaded to {}",
        packaged.len(),
        backend.name()
    );

    cleanup_local_files(&artifacts, &packaged, &report_dirs);

    println!("\n🎉 Backup job completed successfully");
    Ok(())
}

/// Removes everything the job produced locally. The uploads have already
/// succeeded at this point, so failures are reported but swallowed.
fn cleanup_local_files(
    artifacts: &[BackupArtifact],
    packaged: &[PackagedArtifact],
    report_dirs: &[PathBuf],
) {
    for item in packaged {
        if let Err(e) = fs::remove_file(&item.local_path) {
            eprintln!(
                "⚠️ {}",
                AppError::Cleanup(format!(
                    "could not remove archive {}: {}",
                    item.local_path.display(),
                    e
                ))
            );
        }
    }
    for artifact in artifacts {
        if let Err(e) = fs::remove_dir_all(&artifact.local_path) {
            eprintln!(
                "⚠️ {}",
                AppError::Cleanup(format!(
                    "could not remove artifact directory {}: {}",
                    artifact.local_path.display(),
                    e
                ))
            );
        }
    }
    for dir in report_dirs {
        if let Err(e) = fs::remove_dir_all(dir) {
            eprintln!(
                "⚠️ {}",
                AppError::Cleanup(format!(
                    "could not remove report directory {}: {}",
                    dir.display(),
                    e
                ))
            );
        }
    }
}
