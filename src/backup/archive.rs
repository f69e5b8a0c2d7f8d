// neo4jbackuptool/src/backup/archive.rs
use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;
use tar::Builder;
use walkdir::WalkDir;

use crate::backup::{BackupArtifact, ConsistencyReport, PackagedArtifact};
use crate::errors::{AppError, Result};

/// Compresses one backup artifact directory into
/// `<database>-<timestamp>.backup.tar.gz` inside the backup directory.
///
/// The second-resolution timestamp keeps archives from consecutive runs
/// apart without overwriting each other.
pub fn package_artifact(artifact: &BackupArtifact, backup_dir: &Path) -> Result<PackagedArtifact> {
    let timestamp = Local::now().format("%Y-%m-%dT%H_%M_%S");
    let file_name = format!("{}-{}.backup.tar.gz", artifact.database, timestamp);
    package_directory(&artifact.local_path, backup_dir, file_name)
}

/// Compresses a consistency report directory into
/// `<artifact>.report.tar.gz` inside the backup directory.
pub fn package_report(report: &ConsistencyReport, backup_dir: &Path) -> Result<PackagedArtifact> {
    let file_name = format!("{}.report.tar.gz", report.artifact_name);
    package_directory(&report.report_path, backup_dir, file_name)
}

fn package_directory(
    source_dir: &Path,
    backup_dir: &Path,
    file_name: String,
) -> Result<PackagedArtifact> {
    let dest_path = backup_dir.join(&file_name);
    println!(
        "🗜 Compressing {} to {}",
        source_dir.display(),
        dest_path.display()
    );

    create_tar_gz_archive(source_dir, &dest_path)?;

    let size_bytes = std::fs::metadata(&dest_path)
        .map_err(|e| {
            AppError::Packaging(format!(
                "Failed to stat created archive {}: {}",
                dest_path.display(),
                e
            ))
        })?
        .len();

    println!("✓ Archive created at {} ({} bytes)", dest_path.display(), size_bytes);
    Ok(PackagedArtifact {
        file_name,
        local_path: dest_path,
        size_bytes,
    })
}

/// Creates a GZipped TAR archive from a source directory.
///
/// The archive contains all files and directories within `source_dir`;
/// paths inside it are relative to `source_dir`.
fn create_tar_gz_archive(source_dir: &Path, archive_dest_path: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(AppError::Packaging(format!(
            "Source for archival is not a directory: {}",
            source_dir.display()
        )));
    }

    let archive_file = File::create(archive_dest_path).map_err(|e| {
        AppError::Packaging(format!(
            "Failed to create archive file {}: {}",
            archive_dest_path.display(),
            e
        ))
    })?;
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut tar_builder = Builder::new(enc);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| {
            AppError::Packaging(format!(
                "Failed to walk directory {}: {}",
                source_dir.display(),
                e
            ))
        })?;
        let path = entry.path();
        let name = path.strip_prefix(source_dir).map_err(|e| {
            AppError::Packaging(format!(
                "Failed to strip prefix {} from {}: {}",
                source_dir.display(),
                path.display(),
                e
            ))
        })?;

        if name.as_os_str().is_empty() {
            // Skip the root directory itself
            continue;
        }

        if path.is_dir() {
            tar_builder.append_dir(name, path).map_err(|e| {
                AppError::Packaging(format!(
                    "Failed to append directory {} to archive: {}",
                    path.display(),
                    e
                ))
            })?;
        } else if path.is_file() {
            tar_builder.append_path_with_name(path, name).map_err(|e| {
                AppError::Packaging(format!(
                    "Failed to append file {} to archive: {}",
                    path.display(),
                    e
                ))
            })?;
        }
    }

    let encoder = tar_builder.into_inner().map_err(|e| {
        AppError::Packaging(format!(
            "Failed to flush tar builder for {}: {}",
            archive_dest_path.display(),
            e
        ))
    })?;
    encoder.finish().map_err(|e| {
        AppError::Packaging(format!(
            "Failed to finish gzip encoding for {}: {}",
            archive_dest_path.display(),
            e
        ))
    })?;

    Ok(())
}
